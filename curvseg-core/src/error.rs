//! Error types for curvseg

use thiserror::Error;

/// Main error type for curvseg operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for curvseg operations
pub type Result<T> = std::result::Result<T, Error>;
