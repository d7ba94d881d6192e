// Streaming Huffman encoder.
//
// HuffEncoder writes the tree header on construction, then appends the code
// of every byte fed through `write_bytes()`. `finish()` appends the
// end-of-stream code, zero-pads the last byte and flushes.
//
// Whatever bits were accepted reach the writer on every exit. Failures pad
// the partial byte and retry any byte the writer refused before the error
// is returned.

use std::io::{self, Read, Write};

use log::{debug, trace};

use super::table::{Code, EncodingTable};
use crate::bits::{BitWrite, BitWriter, bit_writer};
use crate::error::{CodecError, Result};
use crate::tree::{HuffmanTree, Symbol, header};

/// Input read size used by `compress`.
const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Sizes of one compressed artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressStats {
    /// Uncompressed bytes consumed.
    pub input_bytes: u64,
    /// Tree header size in bytes.
    pub header_bytes: u64,
    /// Payload bits, end-of-stream code included, padding excluded.
    pub payload_bits: u64,
    /// Zero bits appended to reach a byte boundary (0..=7).
    pub padding_bits: u8,
}

impl CompressStats {
    /// Total artifact size in bytes.
    pub fn output_bytes(&self) -> u64 {
        self.header_bytes + (self.payload_bits + u64::from(self.padding_bits)) / 8
    }
}

// ---------------------------------------------------------------------------
// HuffEncoder
// ---------------------------------------------------------------------------

/// Streaming encoder.
///
/// # Example
/// ```no_run
/// use oxihuff::codec::HuffEncoder;
/// use oxihuff::tree::{FrequencyTable, build_tree};
///
/// let data = b"mississippi";
/// let tree = build_tree(&FrequencyTable::from_bytes(data)).unwrap();
/// let mut enc = HuffEncoder::new(Vec::new(), &tree).unwrap();
/// enc.write_bytes(data).unwrap();
/// let (compressed, _stats) = enc.finish().unwrap();
/// ```
pub struct HuffEncoder<W: Write> {
    bits: BitWriter<W>,
    table: EncodingTable,
    eos: Code,
    stats: CompressStats,
}

impl<W: Write> HuffEncoder<W> {
    /// Write the tree header and prepare the encoding table.
    pub fn new(mut writer: W, tree: &HuffmanTree) -> Result<Self> {
        let table = tree.encoding_table();
        let eos = *table
            .get(Symbol::EndOfStream)
            .ok_or_else(|| CodecError::InvalidTree("no end-of-stream code".into()))?;
        let header_bytes = header::write_tree(tree, &mut writer)?;
        debug!(
            "encoder ready: {} codes, longest {} bits, end-of-stream {eos}",
            table.len(),
            table.max_code_len()
        );

        Ok(Self {
            bits: bit_writer(writer),
            table,
            eos,
            stats: CompressStats {
                header_bytes,
                ..Default::default()
            },
        })
    }

    /// Append the codes for `data`.
    ///
    /// Fails with `MissingCode` on the first byte the tree cannot encode;
    /// bytes before it have already been written.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        for &b in data {
            let code = self.table.byte(b).ok_or(CodecError::MissingCode(b))?;
            code.write_to(&mut self.bits)?;
            self.stats.input_bytes += 1;
            self.stats.payload_bits += code.len() as u64;
        }
        trace!("encoded {} bytes", data.len());
        Ok(())
    }

    /// Bytes encoded so far.
    pub fn bytes_in(&self) -> u64 {
        self.stats.input_bytes
    }

    /// Append end-of-stream, pad, flush, and return the writer.
    ///
    /// On failure the bits written so far are still padded and flushed
    /// before the error is returned.
    pub fn finish(mut self) -> Result<(W, CompressStats)> {
        let sealed = self
            .eos
            .write_to(&mut self.bits)
            .and_then(|()| self.bits.byte_align());
        if let Err(e) = sealed {
            self.abandon();
            return Err(e.into());
        }
        self.stats.payload_bits += self.eos.len() as u64;
        self.stats.padding_bits = ((8 - self.stats.payload_bits % 8) % 8) as u8;

        let mut staged = self.bits.into_writer();
        staged.flush()?;
        debug!(
            "encoder finished: {} bytes in, {} payload bits, {} padding bits",
            self.stats.input_bytes, self.stats.payload_bits, self.stats.padding_bits
        );
        Ok((staged.into_inner(), self.stats))
    }

    /// Feed all of `data`, then `finish()`.
    ///
    /// A failed `write_bytes` still commits the bits written before it.
    pub fn encode_all(mut self, data: &[u8]) -> Result<(W, CompressStats)> {
        if let Err(e) = self.write_bytes(data) {
            self.abandon();
            return Err(e);
        }
        self.finish()
    }

    /// Commit whatever bits are pending without an end-of-stream code.
    ///
    /// Used on error paths so partial output is never left in the buffer.
    fn abandon(mut self) {
        if let Err(e) = self.bits.byte_align() {
            debug!("padding after failed encode also failed: {e}");
        }
        let mut staged = self.bits.into_writer();
        if let Err(e) = staged.flush() {
            debug!(
                "flush after failed encode also failed ({} bytes held back): {e}",
                staged.pending()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Compress everything from `input` into `output` using `tree`.
///
/// Buffered bits are committed to `output` on every return path; on
/// failure the partial artifact ends without an end-of-stream code.
pub fn compress<R: Read, W: Write>(
    tree: &HuffmanTree,
    mut input: R,
    output: W,
) -> Result<CompressStats> {
    let mut encoder = HuffEncoder::new(output, tree)?;
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let fed = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => encoder.write_bytes(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(CodecError::Io(e)),
        };
        if let Err(e) = fed {
            encoder.abandon();
            return Err(e);
        }
    }
    encoder.finish().map(|(_, stats)| stats)
}

/// Compress `data` in memory.
pub fn compress_to_vec(tree: &HuffmanTree, data: &[u8]) -> Result<Vec<u8>> {
    HuffEncoder::new(Vec::new(), tree)?
        .encode_all(data)
        .map(|(out, _)| out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
