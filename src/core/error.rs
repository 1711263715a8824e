// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for flvforge.
//!
//! Every failure in the container codec, the metadata value codec and the
//! frame pipeline is reported through [`CodecError`]. Only
//! [`CodecError::CorruptTag`] is ever handled locally, through the bounded
//! recovery scan of the tag reader; every other variant aborts the run.

use std::fmt;
use std::io;

/// Errors that can occur while reading, transforming or writing containers.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// File header signature or layout is invalid. Always fatal.
    MalformedHeader {
        /// Error message
        reason: String,
    },

    /// A tag could not be parsed at the given position.
    ///
    /// Recoverable through [`FlvReader::recover`](crate::io::formats::flv::FlvReader::recover).
    CorruptTag {
        /// Byte offset of the tag header in the source
        position: u64,
        /// What was wrong with the tag
        reason: String,
    },

    /// Recovery scan found no valid tag within its byte budget
    RecoveryExhausted {
        /// Byte offset where the scan started
        position: u64,
        /// Number of bytes examined
        scanned: u64,
    },

    /// Metadata payload ended before a value was complete
    TruncatedInput {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when error occurred
        cursor_pos: u64,
    },

    /// Metadata payload contains a type marker this codec does not know
    UnknownTypeMarker {
        /// The offending marker byte
        marker: u8,
        /// Cursor position of the marker
        cursor_pos: u64,
    },

    /// Error propagated from the underlying storage
    Io {
        /// Kind of the original I/O error
        kind: io::ErrorKind,
        /// Error message
        message: String,
    },

    /// Invalid mode or argument combination
    ConfigError {
        /// Error message
        message: String,
    },

    /// Value cannot be represented on the wire
    EncodeError {
        /// Codec context (e.g., "AMF0", "FLV")
        codec: String,
        /// Error message
        message: String,
    },

    /// Unsupported feature
    Unsupported {
        /// What is not supported
        feature: String,
    },
}

impl CodecError {
    /// Create a malformed header error.
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        CodecError::MalformedHeader {
            reason: reason.into(),
        }
    }

    /// Create a corrupt tag error.
    pub fn corrupt_tag(position: u64, reason: impl Into<String>) -> Self {
        CodecError::CorruptTag {
            position,
            reason: reason.into(),
        }
    }

    /// Create a recovery exhausted error.
    pub fn recovery_exhausted(position: u64, scanned: u64) -> Self {
        CodecError::RecoveryExhausted { position, scanned }
    }

    /// Create a truncated input error.
    pub fn truncated(requested: usize, available: usize, cursor_pos: u64) -> Self {
        CodecError::TruncatedInput {
            requested,
            available,
            cursor_pos,
        }
    }

    /// Create an unknown type marker error.
    pub fn unknown_marker(marker: u8, cursor_pos: u64) -> Self {
        CodecError::UnknownTypeMarker { marker, cursor_pos }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CodecError::ConfigError {
            message: message.into(),
        }
    }

    /// Create an encode error.
    pub fn encode(codec: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::EncodeError {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        CodecError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Whether the caller may attempt a recovery scan for this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::CorruptTag { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::MalformedHeader { reason } => vec![("reason", reason.clone())],
            CodecError::CorruptTag { position, reason } => vec![
                ("position", position.to_string()),
                ("reason", reason.clone()),
            ],
            CodecError::RecoveryExhausted { position, scanned } => vec![
                ("position", position.to_string()),
                ("scanned", scanned.to_string()),
            ],
            CodecError::TruncatedInput {
                requested,
                available,
                cursor_pos,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("cursor", cursor_pos.to_string()),
            ],
            CodecError::UnknownTypeMarker { marker, cursor_pos } => vec![
                ("marker", format!("0x{marker:02x}")),
                ("cursor", cursor_pos.to_string()),
            ],
            CodecError::Io { kind, message } => {
                vec![("kind", format!("{kind:?}")), ("message", message.clone())]
            }
            CodecError::ConfigError { message } => vec![("message", message.clone())],
            CodecError::EncodeError { codec, message } => {
                vec![("codec", codec.clone()), ("message", message.clone())]
            }
            CodecError::Unsupported { feature } => vec![("feature", feature.clone())],
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::MalformedHeader { reason } => write!(f, "Malformed header: {reason}"),
            CodecError::CorruptTag { position, reason } => {
                write!(f, "Corrupt tag at position {position}: {reason}")
            }
            CodecError::RecoveryExhausted { position, scanned } => write!(
                f,
                "Recovery exhausted: no valid tag within {scanned} bytes after position {position}"
            ),
            CodecError::TruncatedInput {
                requested,
                available,
                cursor_pos,
            } => write!(
                f,
                "Truncated input: requested {requested} bytes at position {cursor_pos}, but only {available} bytes available"
            ),
            CodecError::UnknownTypeMarker { marker, cursor_pos } => write!(
                f,
                "Unknown type marker 0x{marker:02x} at position {cursor_pos}"
            ),
            CodecError::Io { message, .. } => write!(f, "I/O error: {message}"),
            CodecError::ConfigError { message } => write!(f, "Configuration error: {message}"),
            CodecError::EncodeError { codec, message } => {
                write!(f, "{codec} encode error: {message}")
            }
            CodecError::Unsupported { feature } => {
                write!(f, "Unsupported feature: '{feature}'")
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type for flvforge operations.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_header_error() {
        let err = CodecError::malformed_header("bad signature");
        assert!(matches!(err, CodecError::MalformedHeader { .. }));
        assert_eq!(err.to_string(), "Malformed header: bad signature");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_corrupt_tag_is_recoverable() {
        let err = CodecError::corrupt_tag(42, "invalid tag type 0x07");
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Corrupt tag at position 42: invalid tag type 0x07"
        );
    }

    #[test]
    fn test_recovery_exhausted_error() {
        let err = CodecError::recovery_exhausted(100, 4096);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Recovery exhausted: no valid tag within 4096 bytes after position 100"
        );
    }

    #[test]
    fn test_truncated_error() {
        let err = CodecError::truncated(8, 3, 17);
        assert_eq!(
            err.to_string(),
            "Truncated input: requested 8 bytes at position 17, but only 3 bytes available"
        );
    }

    #[test]
    fn test_unknown_marker_error() {
        let err = CodecError::unknown_marker(0x0d, 5);
        assert_eq!(err.to_string(), "Unknown type marker 0x0d at position 5");
    }

    #[test]
    fn test_config_error() {
        let err = CodecError::config("no output file");
        assert_eq!(err.to_string(), "Configuration error: no output file");
    }

    #[test]
    fn test_log_fields_corrupt_tag() {
        let err = CodecError::corrupt_tag(13, "trailer mismatch");
        let fields = err.log_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("position", "13".to_string()));
        assert_eq!(fields[1], ("reason", "trailer mismatch".to_string()));
    }

    #[test]
    fn test_log_fields_unknown_marker() {
        let err = CodecError::unknown_marker(0x11, 2);
        let fields = err.log_fields();
        assert_eq!(fields[0], ("marker", "0x11".to_string()));
        assert_eq!(fields[1], ("cursor", "2".to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let codec_err: CodecError = io_err.into();
        assert!(matches!(
            codec_err,
            CodecError::Io {
                kind: io::ErrorKind::NotFound,
                ..
            }
        ));
        assert_eq!(codec_err.to_string(), "I/O error: file not found");
    }

    #[test]
    fn test_error_clone() {
        let err1 = CodecError::corrupt_tag(1, "x");
        let err2 = err1.clone();
        assert_eq!(err1.to_string(), err2.to_string());
    }
}
