// Tree header encoding/decoding.
//
// Layout:
//   magic    "HUF" (3 bytes)
//   version  0x01  (1 byte)
//   shape    pre-order bit stream, MSB-first:
//              internal -> 0, left subtree, right subtree
//              leaf     -> 1, 9-bit symbol index (256 = end-of-stream)
//   pad      zero bits up to the next byte boundary
//
// The header is self-delimiting and always ends on a byte boundary, so the
// payload bit stream starts at a fresh byte.

use std::io::{self, Read, Write};

use log::debug;

use super::{HuffmanTree, Node, SYMBOL_COUNT, Symbol};
use crate::bits::{BigEndian, BitRead, BitReader, BitWrite, bit_reader};
use crate::error::{CodecError, Result};

pub const TREE_MAGIC: [u8; 3] = *b"HUF";
pub const TREE_FORMAT_VERSION: u8 = 0x01;

/// Width of a serialized symbol index.
const SYMBOL_BITS: u32 = 9;

/// A tree with at most 257 distinct leaves is never deeper than this.
const MAX_DEPTH: usize = SYMBOL_COUNT - 1;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Write the header for `tree` to `w`. Returns the header size in bytes.
///
/// The underlying writer is not flushed.
pub fn write_tree<W: Write>(tree: &HuffmanTree, w: &mut W) -> io::Result<u64> {
    w.write_all(&TREE_MAGIC)?;
    w.write_all(&[TREE_FORMAT_VERSION])?;

    let mut bits = bitstream_io::BitWriter::endian(&mut *w, BigEndian);
    let mut shape_bits = 0u64;
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        match node {
            Node::Leaf(symbol) => {
                bits.write_bit(true)?;
                bits.write(SYMBOL_BITS, symbol.index())?;
                shape_bits += 1 + u64::from(SYMBOL_BITS);
            }
            Node::Internal { left, right } => {
                bits.write_bit(false)?;
                shape_bits += 1;
                stack.push(right);
                stack.push(left);
            }
        }
    }
    bits.byte_align()?;

    let size = (TREE_MAGIC.len() + 1) as u64 + shape_bits.div_ceil(8);
    debug!(
        "tree header: {} leaves, depth {}, {size} bytes",
        tree.leaf_count(),
        tree.depth()
    );
    Ok(size)
}

/// Serialize `tree` into a standalone byte vector.
pub fn serialize_tree(tree: &HuffmanTree) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + tree.leaf_count() * 2);
    let written = write_tree(tree, &mut out);
    debug_assert!(
        written.as_ref().is_ok_and(|&size| size == out.len() as u64),
        "header write into a Vec failed or miscounted: {written:?}"
    );
    out
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Read a tree header from `r`, consuming exactly the header bytes.
///
/// Any malformation, truncation included, is reported as
/// `CodecError::CorruptHeader`. Other I/O failures pass through as
/// `CodecError::Io`.
pub fn read_tree<R: Read>(r: &mut R) -> Result<HuffmanTree> {
    let mut preamble = [0u8; 4];
    r.read_exact(&mut preamble).map_err(|e| header_io(e, "magic"))?;
    if preamble[..3] != TREE_MAGIC {
        return Err(CodecError::CorruptHeader(format!(
            "invalid magic: expected {:02X} {:02X} {:02X}, got {:02X} {:02X} {:02X}",
            TREE_MAGIC[0], TREE_MAGIC[1], TREE_MAGIC[2], preamble[0], preamble[1], preamble[2]
        )));
    }
    if preamble[3] != TREE_FORMAT_VERSION {
        return Err(CodecError::CorruptHeader(format!(
            "unsupported header version: {:#04X}",
            preamble[3]
        )));
    }

    let mut parser = ShapeParser {
        bits: bit_reader(&mut *r),
        leaves: 0,
    };
    let root = parser.node(0)?;

    // The rest of the current byte is already buffered; no new byte is read.
    let mut padding = 0u8;
    while !parser.bits.byte_aligned() {
        let bit = parser
            .bits
            .read_bit()
            .map_err(|e| header_io(e, "padding"))?;
        padding = (padding << 1) | u8::from(bit);
    }
    if padding != 0 {
        return Err(CodecError::CorruptHeader(format!(
            "nonzero padding bits after tree shape: {padding:#04X}"
        )));
    }

    let tree = HuffmanTree::new(root).map_err(|e| match e {
        CodecError::InvalidTree(msg) => CodecError::CorruptHeader(msg),
        other => other,
    })?;
    debug!(
        "read tree header: {} leaves, depth {}",
        tree.leaf_count(),
        tree.depth()
    );
    Ok(tree)
}

/// Parse a header that occupies all of `bytes`.
pub fn deserialize_tree(bytes: &[u8]) -> Result<HuffmanTree> {
    let mut cursor = bytes;
    let tree = read_tree(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CodecError::CorruptHeader(format!(
            "{} trailing bytes after tree header",
            cursor.len()
        )));
    }
    Ok(tree)
}

fn header_io(e: io::Error, what: &str) -> CodecError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::CorruptHeader(format!("truncated {what}"))
    } else {
        CodecError::Io(e)
    }
}

/// Recursive pre-order reader for the shape bits.
struct ShapeParser<R: Read> {
    bits: BitReader<R>,
    leaves: usize,
}

impl<R: Read> ShapeParser<R> {
    fn node(&mut self, depth: usize) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(CodecError::CorruptHeader(format!(
                "tree deeper than {MAX_DEPTH} levels"
            )));
        }

        let is_leaf = self
            .bits
            .read_bit()
            .map_err(|e| header_io(e, "tree shape"))?;
        if !is_leaf {
            let left = self.node(depth + 1)?;
            let right = self.node(depth + 1)?;
            return Ok(Node::internal(left, right));
        }

        self.leaves += 1;
        if self.leaves > SYMBOL_COUNT {
            return Err(CodecError::CorruptHeader(format!(
                "more than {SYMBOL_COUNT} leaves"
            )));
        }
        let index = self
            .bits
            .read::<u16>(SYMBOL_BITS)
            .map_err(|e| header_io(e, "leaf symbol"))?;
        let symbol = Symbol::from_index(index).ok_or_else(|| {
            CodecError::CorruptHeader(format!("symbol index {index} out of range"))
        })?;
        Ok(Node::Leaf(symbol))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn abe() -> HuffmanTree {
        HuffmanTree::new(Node::internal(
            Node::leaf(b'a'),
            Node::internal(Node::leaf(b'b'), Node::end_of_stream()),
        ))
        .unwrap()
    }

    type ShapeWriter<'a> = bitstream_io::BitWriter<&'a mut Vec<u8>, BigEndian>;

    /// Header bytes with a hand-written shape section.
    fn raw_header(shape: impl FnOnce(&mut ShapeWriter<'_>)) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&TREE_MAGIC);
        out.push(TREE_FORMAT_VERSION);
        let mut bits = bitstream_io::BitWriter::endian(&mut out, BigEndian);
        shape(&mut bits);
        bits.byte_align().unwrap();
        drop(bits);
        out
    }

    fn leaf(bits: &mut ShapeWriter<'_>, index: u16) {
        bits.write_bit(true).unwrap();
        bits.write(SYMBOL_BITS, index).unwrap();
    }

    fn expect_corrupt(bytes: &[u8]) -> String {
        match deserialize_tree(bytes) {
            Err(CodecError::CorruptHeader(msg)) => msg,
            other => panic!("expected CorruptHeader, got {other:?}"),
        }
    }

    #[test]
    fn known_header_bytes() {
        let bytes = serialize_tree(&abe());
        assert_eq!(bytes, [0x48, 0x55, 0x46, 0x01, 0x4C, 0x29, 0x8B, 0x00]);
    }

    #[test]
    fn write_tree_reports_size() {
        let mut out = Vec::new();
        let size = write_tree(&abe(), &mut out).unwrap();
        assert_eq!(size, out.len() as u64);
    }

    #[test]
    fn serialize_matches_write_tree() {
        let tree = abe();
        let mut streamed = Vec::new();
        let size = write_tree(&tree, &mut streamed).unwrap();
        let bytes = serialize_tree(&tree);
        assert_eq!(bytes, streamed);
        assert_eq!(size, bytes.len() as u64);
    }

    #[test]
    fn roundtrip_small_tree() {
        let tree = abe();
        assert_eq!(deserialize_tree(&serialize_tree(&tree)).unwrap(), tree);
    }

    #[test]
    fn read_tree_stops_at_header_end() {
        let mut bytes = serialize_tree(&abe());
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let mut cursor = &bytes[..];
        read_tree(&mut cursor).unwrap();
        assert_eq!(cursor, &[0xAA, 0xBB]);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        assert!(expect_corrupt(b"HUG\x01\x4C").contains("magic"));
        assert!(expect_corrupt(b"HUF\x02\x4C").contains("version"));
        assert!(expect_corrupt(b"HU").contains("truncated"));
        assert!(expect_corrupt(b"").contains("truncated"));
    }

    #[test]
    fn rejects_truncated_shape() {
        let bytes = serialize_tree(&abe());
        for cut in 4..bytes.len() {
            expect_corrupt(&bytes[..cut]);
        }
    }

    #[test]
    fn rejects_out_of_range_symbol() {
        let bytes = raw_header(|w| {
            w.write_bit(false).unwrap();
            leaf(w, 300);
            leaf(w, 256);
        });
        assert!(expect_corrupt(&bytes).contains("out of range"));
    }

    #[test]
    fn rejects_leaf_root() {
        let bytes = raw_header(|w| leaf(w, 256));
        assert!(expect_corrupt(&bytes).contains("root is a leaf"));
    }

    #[test]
    fn rejects_duplicate_leaf() {
        let bytes = raw_header(|w| {
            w.write_bit(false).unwrap();
            w.write_bit(false).unwrap();
            leaf(w, 7);
            leaf(w, 7);
            leaf(w, 256);
        });
        assert!(expect_corrupt(&bytes).contains("more than one leaf"));
    }

    #[test]
    fn rejects_nonzero_padding() {
        // 0, leaf 'a', leaf EOS = 21 bits, 3 bits of padding.
        let mut bytes = raw_header(|w| {
            w.write_bit(false).unwrap();
            leaf(w, u16::from(b'a'));
            leaf(w, 256);
        });
        assert!(deserialize_tree(&bytes).is_ok());
        *bytes.last_mut().unwrap() |= 0b001;
        assert!(expect_corrupt(&bytes).contains("padding"));
    }

    #[test]
    fn rejects_endless_descent() {
        let mut bytes = TREE_MAGIC.to_vec();
        bytes.push(TREE_FORMAT_VERSION);
        bytes.extend(std::iter::repeat_n(0u8, 64));
        assert!(expect_corrupt(&bytes).contains("deeper"));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = serialize_tree(&abe());
        bytes.push(0);
        assert!(expect_corrupt(&bytes).contains("trailing"));
    }
}
