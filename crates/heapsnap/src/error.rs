//! Error Module - heapsnap Error Types
//!
//! Defines all error types used while producing a snapshot.
//!
//! # Error Categories
//!
//! ## Propagated
//! - `Sink` - The sink rejected a write; the dump stops mid-stream
//! - `EncodeOverflow` - An escaped text would exceed its byte bound
//!
//! ## Setup
//! - `Configuration` - Invalid `ScanConfig`
//!
//! ## Reading snapshots back
//! - `Decode` - A line is not a valid snapshot record
//!
//! Conditions the scanner swallows on purpose (undefined length, a failed
//! exclusion membership test, a declined size override) never show up here.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for all heapsnap operations
///
/// # Examples
///
/// ```rust
/// use heapsnap::ScanError;
///
/// fn handle_error(err: ScanError) {
///     match err {
///         ScanError::EncodeOverflow { needed, limit } => {
///             eprintln!("escaped text needs {} bytes, limit is {}", needed, limit);
///         }
///         ScanError::Sink(io) => {
///             eprintln!("snapshot truncated: {}", io);
///         }
///         _ => {
///             eprintln!("Other error: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ScanError {
    /// Sink write failed
    ///
    /// **When returned:** The underlying `io::Write` returned an error
    ///
    /// **Recovery strategy:** None inside the scanner. Records already on the
    /// sink stay there; downstream readers must tolerate a truncated stream.
    #[error("Sink write failed: {0}")]
    Sink(#[from] std::io::Error),

    /// Escaped text would overrun its bound
    ///
    /// **When returned:** The quoted, escaped form of a text buffer needs
    /// more than `ScanConfig::encode_limit` bytes
    ///
    /// **Recovery strategy:** Raise the limit. Nothing was written for the
    /// record being encoded.
    #[error("Escaped text needs {needed} bytes, exceeding the {limit} byte bound")]
    EncodeOverflow { needed: usize, limit: usize },

    /// Configuration error
    ///
    /// **When returned:** `ScanConfig::validate` rejected the configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Snapshot line could not be decoded
    ///
    /// **When returned:** `SnapshotRecord::parse_line` got malformed JSON or a
    /// record missing required keys
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ScanError {
    /// Check if this error is recoverable
    ///
    /// An encode overflow only affects the record being written, so a caller
    /// driving its own walk may skip the object and continue. A sink failure
    /// leaves the stream unusable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScanError::EncodeOverflow { .. } | ScanError::Decode(_))
    }

    /// Check if the sink is the failing party
    pub fn is_sink_failure(&self) -> bool {
        matches!(self, ScanError::Sink(_))
    }
}

/// Result type alias for heapsnap operations
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_converts_to_sink() {
        let err: ScanError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(err.is_sink_failure());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_overflow_is_recoverable() {
        let err = ScanError::EncodeOverflow {
            needed: 2048,
            limit: 1024,
        };
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Escaped text needs 2048 bytes, exceeding the 1024 byte bound"
        );
    }
}
