//! Error types for the data layer.
//!
//! All errors are propagated via [`StoreError`], which records which
//! document the failing operation touched.

use crate::document::DocumentKey;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a document file failed.
    #[error("I/O error on {key}: {source}")]
    Io {
        /// The document being accessed.
        key: DocumentKey,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Creating the data directory failed.
    #[error("cannot create data directory {path}: {source}")]
    DataDir {
        /// Directory that could not be created.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A shared in-memory store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}
