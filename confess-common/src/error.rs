//! Common error types for ConfessWorld

use thiserror::Error;

/// Common result type for ConfessWorld operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ConfessWorld crates
#[derive(Error, Debug)]
pub enum Error {
    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required form input missing or malformed; never reaches the remote service
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote service failure (network, HTTP status, or malformed response)
    #[error("Remote service error: {0}")]
    Remote(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
