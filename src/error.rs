use std::io;

use thiserror::Error;

/// Errors that can occur while probing a byte source
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A read ran past the end of the available bytes
    #[error("unexpected end of stream at byte {position}")]
    EndOfStream {
        /// Byte position of the failed read
        position: u64,
    },

    /// A recognized structure contained a malformed field
    #[error("malformed {structure}: {reason}")]
    Decode {
        /// The structure being decoded when the error occurred
        structure: &'static str,
        /// Description of the defect
        reason: String,
    },

    /// No supported container matched the leading bytes
    #[error("no supported container recognized")]
    UnsupportedContainer,

    /// Recognized container, unknown sub-format
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The byte source reported cancellation
    #[error("parse cancelled by byte source")]
    Cancelled,

    /// I/O error from the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl ProbeError {
    /// Shorthand for a [`ProbeError::Decode`] with a formatted reason
    pub fn decode(structure: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            structure,
            reason: reason.into(),
        }
    }

    /// Check whether this error is a truncation of the byte source
    ///
    /// Parsers use this to tolerate files cut short after the metadata
    /// region: truncation downgrades to a warning, other errors propagate.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::EndOfStream { .. })
            || matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Interrupted => Self::Cancelled,
            _ => Self::Io(err),
        }
    }
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::EndOfStream { position: 42 };
        assert_eq!(err.to_string(), "unexpected end of stream at byte 42");

        let err = ProbeError::decode("ID3v2 frame", "bad size");
        assert_eq!(err.to_string(), "malformed ID3v2 frame: bad size");
    }

    #[test]
    fn test_interrupted_maps_to_cancelled() {
        let io_err = io::Error::new(io::ErrorKind::Interrupted, "dropped");
        let err: ProbeError = io_err.into();
        assert!(matches!(err, ProbeError::Cancelled));
    }

    #[test]
    fn test_other_io_passes_through() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: ProbeError = io_err.into();
        assert!(matches!(err, ProbeError::Io(_)));
    }

    #[test]
    fn test_is_truncation() {
        assert!(ProbeError::EndOfStream { position: 0 }.is_truncation());
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(ProbeError::Io(eof).is_truncation());
        assert!(!ProbeError::UnsupportedContainer.is_truncation());
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProbeError>();
    }
}
