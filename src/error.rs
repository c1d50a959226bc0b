//! Error types for Tapedeck

use std::io;
use thiserror::Error;

/// Result type for Tapedeck operations
pub type Result<T> = std::result::Result<T, TapeError>;

/// Errors that can occur while using a tape
#[derive(Debug, Error)]
pub enum TapeError {
    /// Playback attempted on a tape whose mode is not readable
    #[error("the tape is not readable")]
    NotReadable,

    /// Recording attempted on a tape whose mode is not writable
    #[error("the tape is not writable")]
    NotWritable,

    /// Sequential cursor points past the last recorded interaction
    #[error("No recording found at position {position}")]
    Exhausted {
        /// Cursor position that had no interaction
        position: usize,
    },

    /// Recorded request at the sequential position does not match the live one
    #[error("Request {live} does not match recorded request {recorded}")]
    MismatchedRequest {
        /// Description of the live request
        live: String,
        /// Description of the recorded request
        recorded: String,
    },

    /// No recorded interaction satisfies the match rules
    #[error("no matching recording found for {method} {uri}")]
    NoMatch {
        /// Method of the live request
        method: String,
        /// URI of the live request
        uri: String,
    },

    /// I/O error, including undecodable message bodies
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid tape name
    #[error("Invalid tape name: {0}")]
    InvalidTapeName(String),
}
