// Codec error type shared by the tree, table, automaton and framing layers.

use std::io;

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced while compressing or decompressing a stream.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The tree header could not be parsed. Raised before any payload bit
    /// is consumed.
    #[error("corrupt tree header: {0}")]
    CorruptHeader(String),

    /// The tree violates a structural invariant (leaf root, duplicate
    /// symbol, missing end-of-stream leaf).
    #[error("invalid tree: {0}")]
    InvalidTree(String),

    /// The bit source ran dry before a leaf was reached.
    #[error("bit stream ended before a complete code")]
    TruncatedStream,

    /// An input byte has no leaf in the tree.
    #[error("byte {0:#04X} has no code in the tree")]
    MissingCode(u8),

    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// True for the exhaustion condition the lenient decode loop absorbs.
    #[inline]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::TruncatedStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_predicate() {
        assert!(CodecError::TruncatedStream.is_truncation());
        assert!(!CodecError::CorruptHeader("x".into()).is_truncation());
        assert!(!CodecError::MissingCode(7).is_truncation());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            CodecError::MissingCode(0x41).to_string(),
            "byte 0x41 has no code in the tree"
        );
        assert_eq!(
            CodecError::TruncatedStream.to_string(),
            "bit stream ended before a complete code"
        );
        let io = CodecError::from(io::Error::other("boom"));
        assert!(io.to_string().starts_with("I/O error"));
    }
}
