// Bit-level plumbing on top of `bitstream_io`.
//
// All bit streams are MSB-first (`BigEndian`). `bitstream_io::BitReader`
// pulls one byte from its reader whenever its bit queue is empty, so it never
// reads past the byte holding the current bit; the tree header and the
// payload can share a single reader because of that.
//
// On the write side, `bitstream_io::BitWriter` hands every completed byte to
// its writer and forgets it. `StagedWriter` sits underneath and keeps any
// byte the real writer refused, so a later `flush()` can still commit it.

use std::io::{self, Read, Write};

pub use bitstream_io::{BigEndian, BitRead, BitWrite};

/// MSB-first bit reader.
pub type BitReader<R> = bitstream_io::BitReader<R, BigEndian>;

/// MSB-first bit writer over a staged sink.
pub type BitWriter<W> = bitstream_io::BitWriter<StagedWriter<W>, BigEndian>;

/// Wrap `reader` for MSB-first bit access.
pub fn bit_reader<R: Read>(reader: R) -> BitReader<R> {
    bitstream_io::BitReader::endian(reader, BigEndian)
}

/// Wrap `writer` for MSB-first bit output with staging.
pub fn bit_writer<W: Write>(writer: W) -> BitWriter<W> {
    bitstream_io::BitWriter::endian(StagedWriter::new(writer), BigEndian)
}

// ---------------------------------------------------------------------------
// BitSource
// ---------------------------------------------------------------------------

/// A source of single bits.
///
/// Exhaustion must be reported as `io::ErrorKind::UnexpectedEof`; the
/// decode automaton maps that to `TruncatedStream` and passes every other
/// error through.
pub trait BitSource {
    fn read_bit(&mut self) -> io::Result<bool>;
}

impl<R: Read> BitSource for BitReader<R> {
    #[inline]
    fn read_bit(&mut self) -> io::Result<bool> {
        BitRead::read_bit(self)
    }
}

/// Counts the bits pulled through it.
#[derive(Debug)]
pub struct CountingSource<S> {
    inner: S,
    consumed: u64,
}

impl<S: BitSource> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, consumed: 0 }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BitSource> BitSource for CountingSource<S> {
    #[inline]
    fn read_bit(&mut self) -> io::Result<bool> {
        let bit = self.inner.read_bit()?;
        self.consumed += 1;
        Ok(bit)
    }
}

// ---------------------------------------------------------------------------
// StagedWriter
// ---------------------------------------------------------------------------

/// Writer that keeps bytes the inner writer failed to take.
///
/// A failed `write` still reports the error, but the bytes stay queued in
/// order ahead of anything written later, and `flush()` retries them.
#[derive(Debug)]
pub struct StagedWriter<W: Write> {
    inner: W,
    backlog: Vec<u8>,
}

impl<W: Write> StagedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            backlog: Vec::new(),
        }
    }

    /// Bytes accepted but not yet taken by the inner writer.
    pub fn pending(&self) -> usize {
        self.backlog.len()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Return the inner writer. Call `flush()` first; the backlog is dropped.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn commit_backlog(&mut self) -> io::Result<()> {
        while !self.backlog.is_empty() {
            match self.inner.write(&self.backlog) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.backlog.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for StagedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.backlog.extend_from_slice(buf);
        self.commit_backlog()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit_backlog()?;
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Writer whose next `write` fails once when `fail_next` is set.
    #[derive(Default)]
    struct Hiccup {
        out: Vec<u8>,
        fail_next: bool,
    }

    impl Write for Hiccup {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if std::mem::take(&mut self.fail_next) {
                return Err(io::Error::other("transient"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_packs_msb_first() {
        let mut w = bit_writer(Vec::new());
        for bit in [false, true, false, true, true] {
            w.write_bit(bit).unwrap();
        }
        assert!(!w.byte_aligned());
        w.byte_align().unwrap();
        let out = w.into_writer().into_inner();
        assert_eq!(out, vec![0b0101_1000]);
    }

    #[test]
    fn reader_reads_msb_first() {
        let data = [0b1010_0000u8, 0xFF];
        let mut r = bit_reader(&data[..]);
        assert!(BitRead::read_bit(&mut r).unwrap());
        assert!(!BitRead::read_bit(&mut r).unwrap());
        assert_eq!(r.read::<u8>(2).unwrap(), 0b10);
        assert_eq!(r.read::<u8>(8).unwrap(), 0b0000_1111);
    }

    #[test]
    fn exhaustion_is_unexpected_eof() {
        let data = [0x80u8];
        let mut r = bit_reader(&data[..]);
        assert_eq!(r.read::<u8>(8).unwrap(), 0x80);
        let err = BitSource::read_bit(&mut r).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn reader_does_not_read_ahead() {
        let data = [0xF0u8, 0x11, 0x22];
        let mut cursor = io::Cursor::new(&data[..]);
        {
            let mut r = bit_reader(&mut cursor);
            r.read::<u8>(4).unwrap();
            r.byte_align();
        }
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn counting_source_tracks_bits() {
        let data = [0xA5u8];
        let mut src = CountingSource::new(bit_reader(&data[..]));
        for _ in 0..5 {
            src.read_bit().unwrap();
        }
        assert_eq!(src.consumed(), 5);
        assert!(src.read_bit().is_ok());
        assert_eq!(src.consumed(), 6);
    }

    #[test]
    fn staged_writer_keeps_refused_bytes() {
        let mut w = StagedWriter::new(Hiccup {
            fail_next: true,
            ..Default::default()
        });
        assert!(w.write_all(&[0x01]).is_err());
        assert_eq!(w.pending(), 1);
        assert!(w.get_ref().out.is_empty());

        w.write_all(&[0x02]).unwrap();
        w.flush().unwrap();
        assert_eq!(w.pending(), 0);
        assert_eq!(w.into_inner().out, vec![0x01, 0x02]);
    }

    #[test]
    fn failed_bit_write_is_not_lost() {
        let mut w = bit_writer(Hiccup {
            fail_next: true,
            ..Default::default()
        });
        w.write::<u8>(8, 0xC3).unwrap_err();
        w.write_bit(true).unwrap();
        w.byte_align().unwrap();
        let mut staged = w.into_writer();
        staged.flush().unwrap();
        assert_eq!(staged.into_inner().out, vec![0xC3, 0x80]);
    }
}
