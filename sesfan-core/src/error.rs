//! Error types for the sesfan system

use thiserror::Error;

/// Core error type for enclosure operations
#[derive(Error, Debug)]
pub enum SesFanError {
    /// The transport could not be started or talked to
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport ran but reported failure
    #[error("Command failed with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    /// Control page is missing bytes needed for the fan slots
    #[error("Control page too short: {len} bytes (need at least {required})")]
    ControlPageTooShort { len: usize, required: usize },

    /// A token in a page dump is not a single hex byte
    #[error("Invalid hex byte token at position {position}: {token:?}")]
    InvalidHexToken { position: usize, token: String },

    /// Fan index out of range
    #[error("Fan index out of range: {index} (must be 0-{max})", max = fan_count - 1)]
    InvalidFanIndex { index: usize, fan_count: usize },

    /// Speed level outside 1-7
    #[error("Invalid speed level: {0} (must be 1-7)")]
    InvalidSpeedLevel(u8),

    /// No device matched the enclosure signature
    #[error("Could not find enclosure")]
    EnclosureNotFound,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for sesfan operations
pub type Result<T> = std::result::Result<T, SesFanError>;

impl From<serde_json::Error> for SesFanError {
    fn from(err: serde_json::Error) -> Self {
        SesFanError::Serialization(err.to_string())
    }
}
