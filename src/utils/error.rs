use std::io;
use thiserror::Error;

/// Main error type for the codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// An I/O error occurred while reading or writing a container.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A bit stream ran out in the middle of a read.
    #[error("Bit stream exhausted at bit {position}")]
    EndOfStream { position: usize },
    /// The stream references something that was never encoded.
    #[error("Corrupt stream: {0}")]
    Corrupt(String),
    /// A configuration value the codec cannot work with.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
}

impl CodecError {
    /// True for both bit-level exhaustion and a short container read.
    pub fn is_exhaustion(&self) -> bool {
        match self {
            CodecError::EndOfStream { .. } => true,
            CodecError::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        CodecError::Corrupt(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CodecError::InvalidConfig(msg.into())
    }
}

/// A specialized `Result` type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        assert_eq!(
            CodecError::Io(io_error).to_string(),
            "I/O error: file not found"
        );

        assert_eq!(
            CodecError::EndOfStream { position: 17 }.to_string(),
            "Bit stream exhausted at bit 17"
        );

        assert_eq!(
            CodecError::corrupt("unknown tag 9").to_string(),
            "Corrupt stream: unknown tag 9"
        );

        assert_eq!(
            CodecError::config("block size 12").to_string(),
            "Invalid configuration: block size 12"
        );
    }

    #[test]
    fn test_exhaustion_kinds() {
        assert!(CodecError::EndOfStream { position: 0 }.is_exhaustion());
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert!(CodecError::from(eof).is_exhaustion());
        assert!(!CodecError::corrupt("x").is_exhaustion());
    }
}
