//! Common error types for the build and preview contexts

use thiserror::Error;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across both contexts
#[derive(Error, Debug)]
pub enum Error {
    /// Option loading or validation error (fatal, reported before any fetch)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed schema or composite type name collision
    #[error("Schema error: {0}")]
    Schema(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document, page, index or media fetch failure
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A second real node was created under an existing id
    #[error("Node conflict: {0}")]
    NodeConflict(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
