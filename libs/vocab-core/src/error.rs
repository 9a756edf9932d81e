//! Error types for vocab-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result type alias using StoreError.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while loading word catalog files.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid word file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate word ID {id} in category {category}")]
    DuplicateId { id: String, category: String },
}

/// Errors raised by key-value store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidData { key: String, value: String },
}
