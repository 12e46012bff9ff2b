//! Error types for persistence operations.

use thiserror::Error;

/// A key/value store operation failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error in a file-backed store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused or could not complete the operation
    #[error("Store operation on '{key}' failed: {message}")]
    Unavailable {
        /// Key the operation targeted (empty for whole-store operations)
        key: String,
        /// Description of the failure
        message: String,
    },

    /// A key that cannot be mapped onto the backing store
    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Create an unavailable-store error.
    pub fn unavailable(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while saving, loading, exporting, or importing.
#[derive(Error, Debug)]
pub enum PersistError {
    /// I/O error while reading or writing an export file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An embedded image payload is not valid base64
    #[error("Invalid image data for '{id}': {source}")]
    Base64 {
        /// Image id the payload belongs to
        id: String,
        /// Decoder error
        source: base64::DecodeError,
    },

    /// The backing store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The document does not have the expected top-level shape
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of what is wrong
        message: String,
    },
}

impl PersistError {
    /// Create an invalid document error with a message.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
