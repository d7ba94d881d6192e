// File-level helpers.
//
// `compress_file()` reads the input fully (the tree is built from its byte
// frequencies), then streams the artifact out through a `BufWriter`.
// `decompress_file()` streams in both directions. With the `file-io`
// feature, SHA-256 digests of the uncompressed data are computed on the fly
// so callers can compare them.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
#[cfg(feature = "file-io")]
use sha2::Digest;
use thiserror::Error;

use crate::codec::{DecodeOptions, HuffDecoder, HuffEncoder};
use crate::error::CodecError;
use crate::tree::{FrequencyTable, build_tree};

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `compress_file()`.
#[derive(Debug, Clone)]
pub struct CompressFileStats {
    /// Uncompressed input size in bytes.
    pub input_size: u64,
    /// Compressed output size in bytes.
    pub output_size: u64,
    /// Tree header size in bytes.
    pub header_size: u64,
    /// Distinct byte values in the input.
    pub distinct_symbols: usize,
    /// SHA-256 of the input (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decompress_file()`.
#[derive(Debug, Clone)]
pub struct DecompressFileStats {
    /// Compressed input size in bytes.
    pub input_size: u64,
    /// Decompressed output size in bytes.
    pub output_size: u64,
    /// Whether the stream ended with its end-of-stream code.
    pub end_marker_seen: bool,
    /// SHA-256 of the output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// File open, read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Compression or decompression failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

// ---------------------------------------------------------------------------
// compress_file
// ---------------------------------------------------------------------------

/// Build a tree from `input_path`'s byte frequencies and compress it to
/// `output_path`.
pub fn compress_file(input_path: &Path, output_path: &Path) -> Result<CompressFileStats, IoError> {
    let data = std::fs::read(input_path)?;
    let freqs = FrequencyTable::from_bytes(&data);
    let tree = build_tree(&freqs)?;

    let output_file = File::create(output_path)?;
    let writer = BufWriter::with_capacity(BUF_SIZE, output_file);

    let (writer, stats) = HuffEncoder::new(writer, &tree)?.encode_all(&data)?;
    let output_size = writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .metadata()?
        .len();

    #[cfg(feature = "file-io")]
    let input_sha256 = Some(sha2::Sha256::digest(&data).into());
    #[cfg(not(feature = "file-io"))]
    let input_sha256: Option<[u8; 32]> = None;

    info!(
        "compressed {} -> {} bytes ({} distinct symbols)",
        data.len(),
        output_size,
        freqs.distinct()
    );

    Ok(CompressFileStats {
        input_size: data.len() as u64,
        output_size,
        header_size: stats.header_bytes,
        distinct_symbols: freqs.distinct(),
        input_sha256,
    })
}

// ---------------------------------------------------------------------------
// decompress_file
// ---------------------------------------------------------------------------

/// Decompress `input_path` into `output_path`.
pub fn decompress_file(
    input_path: &Path,
    output_path: &Path,
    opts: DecodeOptions,
) -> Result<DecompressFileStats, IoError> {
    let input_file = File::open(input_path)?;
    let input_size = input_file.metadata()?.len();
    let reader = BufReader::with_capacity(BUF_SIZE, input_file);

    let mut decoder = HuffDecoder::with_options(reader, opts)?;

    let output_file = File::create(output_path)?;
    let mut output_writer = BufWriter::with_capacity(BUF_SIZE, output_file);

    #[cfg(feature = "file-io")]
    let mut output_hasher = sha2::Sha256::new();

    #[cfg(feature = "file-io")]
    let output_size = {
        let mut hashing_writer = HashingWriter {
            inner: &mut output_writer,
            hasher: &mut output_hasher,
        };
        decoder.decode_to(&mut hashing_writer)?
    };

    #[cfg(not(feature = "file-io"))]
    let output_size = decoder.decode_to(&mut output_writer)?;

    output_writer.flush()?;

    #[cfg(feature = "file-io")]
    let output_sha256 = Some(output_hasher.finalize().into());
    #[cfg(not(feature = "file-io"))]
    let output_sha256: Option<[u8; 32]> = None;

    info!("decompressed {input_size} -> {output_size} bytes");

    Ok(DecompressFileStats {
        input_size,
        output_size,
        end_marker_seen: decoder.end_marker_seen(),
        output_sha256,
    })
}

// ---------------------------------------------------------------------------
// Hashing writer (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_decompress_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let packed = dir.path().join("input.huf");
        let output = dir.path().join("output.txt");
        let data = b"The quick brown fox jumps over the lazy dog. 1234567890";
        std::fs::write(&input, data).unwrap();

        let cstats = compress_file(&input, &packed).unwrap();
        assert_eq!(cstats.input_size, data.len() as u64);
        assert_eq!(cstats.output_size, std::fs::metadata(&packed).unwrap().len());
        assert!(cstats.header_size > 4);

        let dstats = decompress_file(&packed, &output, DecodeOptions::default()).unwrap();
        assert_eq!(dstats.input_size, cstats.output_size);
        assert_eq!(dstats.output_size, data.len() as u64);
        assert!(dstats.end_marker_seen);
        assert_eq!(std::fs::read(&output).unwrap(), data);
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty");
        let packed = dir.path().join("empty.huf");
        let output = dir.path().join("empty.out");
        std::fs::write(&input, b"").unwrap();

        let cstats = compress_file(&input, &packed).unwrap();
        assert_eq!(cstats.distinct_symbols, 0);
        decompress_file(&packed, &output, DecodeOptions::strict()).unwrap();
        assert!(std::fs::read(&output).unwrap().is_empty());
    }

    #[test]
    fn skewed_data_shrinks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("skewed");
        let packed = dir.path().join("skewed.huf");
        let data: Vec<u8> = (0..64 * 1024)
            .map(|i| if i % 16 == 0 { b'b' } else { b'a' })
            .collect();
        std::fs::write(&input, &data).unwrap();

        let stats = compress_file(&input, &packed).unwrap();
        assert!(stats.output_size * 4 < stats.input_size);
    }

    #[test]
    fn corrupt_input_reports_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("garbage");
        let output = dir.path().join("garbage.out");
        std::fs::write(&input, b"definitely not compressed").unwrap();

        let err = decompress_file(&input, &output, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Codec(CodecError::CorruptHeader(_))));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compress_file(&dir.path().join("nope"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_checksums_match() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sha_in");
        let packed = dir.path().join("sha.huf");
        let output = dir.path().join("sha_out");
        std::fs::write(&input, b"checksum me, checksum me twice").unwrap();

        let cstats = compress_file(&input, &packed).unwrap();
        let dstats = decompress_file(&packed, &output, DecodeOptions::default()).unwrap();
        assert!(cstats.input_sha256.is_some());
        assert_eq!(cstats.input_sha256, dstats.output_sha256);
    }
}
