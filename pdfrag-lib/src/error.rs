//! Error types for pdfrag

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pdfrag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pdfrag operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load or run the embedding model, or the API rejected the request
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The embedding API refused the credential
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The embedding API quota or rate limit was hit
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Failed to store or retrieve from vector store
    #[error("store error: {0}")]
    Store(String),

    /// Collection, document or chunk not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A source document could not be read or parsed
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// Configuration could not be loaded or is incomplete
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}
