//! Error types shared across pubdata crates

use thiserror::Error;

/// Result type alias for shared pubdata operations
pub type Result<T> = std::result::Result<T, PubdataError>;

/// Errors raised by shared infrastructure (logging, configuration parsing)
#[derive(Error, Debug)]
pub enum PubdataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {name} value: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Logging error: {0}")]
    Logging(String),
}
