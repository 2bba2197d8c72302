//! Error types for storage-context operations.

use statekit_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during storage-context operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the given object id.
    #[error("object not found: {id}")]
    ObjectNotFound { id: ObjectId },

    /// A record with this object id already exists.
    #[error("object already stored: {id}")]
    DuplicateObject { id: ObjectId },

    /// A child dict arrived without a parseable `uuid` bookkeeping key.
    #[error("child dict has no object identity under key {key:?}")]
    MissingIdentity { key: String },

    /// The named relationship does not exist on the record.
    #[error("unknown relationship {key:?} on object {id}")]
    UnknownRelationship { id: ObjectId, key: String },

    /// A relationship position is out of range.
    #[error("index {index} out of range for relationship {key:?} (len {len})")]
    IndexOutOfRange {
        key: String,
        index: usize,
        len: usize,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based context operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience type alias for storage-context operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
