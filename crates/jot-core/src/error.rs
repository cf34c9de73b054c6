//! Error types for jot-core

use thiserror::Error;

/// Result type alias using jot-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by jot-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Field constraint violated client-side, before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Permission or session rejection from the backend
    #[error("Auth error: {0}")]
    Auth(String),

    /// Image upload failed or returned no identifier
    #[error("Upload error: {0}")]
    Upload(String),

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Mutation target no longer exists remotely
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local secure storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
