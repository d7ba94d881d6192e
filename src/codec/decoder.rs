// Streaming Huffman decoder.
//
// HuffDecoder reads the tree header on construction, then runs the decode
// automaton once per output byte until the end-of-stream symbol appears.
// Bits after the end-of-stream code are never read.
//
// Running out of bits before the end-of-stream code is, by default, treated
// as the end of the data: what was decoded so far is kept and a warning is
// logged. `DecodeOptions::strict` turns that case into `TruncatedStream`.

use std::io::{Read, Write};

use log::{debug, warn};

use crate::bits::{BitReader, CountingSource, bit_reader};
use crate::error::Result;
use crate::tree::{HuffmanTree, Symbol, header};

/// Output staging size used by `decode_to`.
const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail with `TruncatedStream` when the input ends before the
    /// end-of-stream code instead of returning the bytes decoded so far.
    pub strict: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Outcome of a full decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecompressStats {
    /// Decoded bytes written.
    pub output_bytes: u64,
    /// Payload bits consumed, end-of-stream code included.
    pub payload_bits: u64,
    /// Whether decoding stopped at the end-of-stream code rather than at
    /// the end of the input.
    pub end_marker_seen: bool,
}

// ---------------------------------------------------------------------------
// HuffDecoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Payload,
    EndMarker,
    Exhausted,
}

/// Streaming decoder.
pub struct HuffDecoder<R: Read> {
    tree: HuffmanTree,
    bits: CountingSource<BitReader<R>>,
    opts: DecodeOptions,
    state: State,
    bytes_decoded: u64,
}

impl<R: Read> HuffDecoder<R> {
    /// Read the tree header from `reader`.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(mut reader: R, opts: DecodeOptions) -> Result<Self> {
        let tree = header::read_tree(&mut reader)?;
        Ok(Self {
            tree,
            bits: CountingSource::new(bit_reader(reader)),
            opts,
            state: State::Payload,
            bytes_decoded: 0,
        })
    }

    /// The tree recovered from the header.
    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    /// Decode the next byte. `None` once the stream has ended.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.state != State::Payload {
            return Ok(None);
        }

        match self.tree.decode_one(&mut self.bits) {
            Ok(Symbol::Byte(b)) => {
                self.bytes_decoded += 1;
                Ok(Some(b))
            }
            Ok(Symbol::EndOfStream) => {
                self.state = State::EndMarker;
                debug!(
                    "end-of-stream after {} bytes, {} payload bits",
                    self.bytes_decoded,
                    self.bits.consumed()
                );
                Ok(None)
            }
            Err(e) if e.is_truncation() => {
                self.state = State::Exhausted;
                if self.opts.strict {
                    return Err(e);
                }
                warn!(
                    "input ended without an end-of-stream code after {} bytes",
                    self.bytes_decoded
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Decode the rest of the stream into `writer`.
    ///
    /// Returns the total number of bytes decoded by this decoder.
    pub fn decode_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64> {
        let mut staged = Vec::with_capacity(BUF_SIZE);
        while let Some(b) = self.next_byte()? {
            staged.push(b);
            if staged.len() == BUF_SIZE {
                writer.write_all(&staged)?;
                staged.clear();
            }
        }
        writer.write_all(&staged)?;
        Ok(self.bytes_decoded)
    }

    /// Total bytes decoded so far.
    pub fn bytes_decoded(&self) -> u64 {
        self.bytes_decoded
    }

    /// Payload bits consumed so far.
    pub fn payload_bits(&self) -> u64 {
        self.bits.consumed()
    }

    /// True once the end-of-stream code has been decoded.
    pub fn end_marker_seen(&self) -> bool {
        self.state == State::EndMarker
    }

    pub fn stats(&self) -> DecompressStats {
        DecompressStats {
            output_bytes: self.bytes_decoded,
            payload_bits: self.bits.consumed(),
            end_marker_seen: self.end_marker_seen(),
        }
    }

    /// Return the underlying reader, positioned after the last byte touched.
    pub fn into_inner(self) -> R {
        self.bits.into_inner().into_reader()
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Decompress `input` into `output` with default (lenient) options.
pub fn decompress<R: Read, W: Write>(input: R, output: W) -> Result<DecompressStats> {
    decompress_with(input, output, DecodeOptions::default())
}

/// Decompress `input` into `output`.
pub fn decompress_with<R: Read, W: Write>(
    input: R,
    mut output: W,
    opts: DecodeOptions,
) -> Result<DecompressStats> {
    let mut decoder = HuffDecoder::with_options(input, opts)?;
    decoder.decode_to(&mut output)?;
    output.flush()?;
    Ok(decoder.stats())
}

/// Decompress an in-memory artifact.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompress(data, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
