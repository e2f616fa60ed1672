//! Error types shared by the payload resolver, request builder and transport.
//!
//! # Error Hierarchy
//!
//! ```text
//! WelesError
//! ├── Validation(String)     -- bad argument shape, raised before any I/O
//! ├── NotFound(PathBuf)      -- referenced local file is missing
//! ├── Serialization(String)  -- model or table could not be encoded
//! ├── Transport(String)      -- network failure, surfaced unchanged
//! ├── Server { status, body } -- non-success response on a decoded endpoint
//! ├── Parse(String)          -- response body not in the expected shape
//! └── Io(std::io::Error)     -- local filesystem failure
//! ```
//!
//! Nothing in this workspace retries: every variant is returned to the caller
//! as soon as it happens.

use std::path::PathBuf;
use thiserror::Error;

/// The canonical error type for weles client operations.
#[derive(Debug, Error)]
pub enum WelesError {
    /// An argument had the wrong shape or value.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// A path given as input does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An in-memory object could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The HTTP call itself failed (DNS, connection, I/O on the socket).
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Server returned status {status}: {body}")]
    Server { status: u16, body: String },

    /// The server answered, but the body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the workspace.
pub type WelesResult<T> = Result<T, WelesError>;

impl WelesError {
    /// Shorthand for a validation failure.
    pub fn invalid(msg: impl Into<String>) -> Self {
        WelesError::Validation(msg.into())
    }

    /// True for errors raised before anything touched the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WelesError::Validation(_)
                | WelesError::NotFound(_)
                | WelesError::Serialization(_)
                | WelesError::Io(_)
        )
    }
}

impl From<bincode::Error> for WelesError {
    fn from(err: bincode::Error) -> Self {
        WelesError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for WelesError {
    fn from(err: csv::Error) -> Self {
        WelesError::Serialization(format!("delimited text: {}", err))
    }
}
