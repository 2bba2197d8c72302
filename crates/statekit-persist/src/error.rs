//! Error types for persistent-object operations.

use statekit_store::StoreError;
use statekit_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during persistent-object operations.
#[derive(Debug, Error)]
pub enum PersistError {
    /// A mutation or read referenced a storage key with no descriptor.
    /// Programmer error; not recovered.
    #[error("unknown key: {key:?}")]
    UnknownKey { key: String },

    /// A descriptor validator rejected the value.
    #[error("validation failed for {key:?}: {reason}")]
    Validation { key: String, reason: String },

    /// A descriptor converter could not transform the value.
    #[error("conversion failed for {key:?}: {reason}")]
    Conversion { key: String, reason: String },

    /// A relationship position is out of range.
    #[error("index {index} out of range for relationship {key:?} (len {len})")]
    IndexOutOfRange {
        key: String,
        index: usize,
        len: usize,
    },

    /// The named child is not in the relationship.
    #[error("child {id} not found in relationship {key:?}")]
    ChildNotFound { key: String, id: ObjectId },

    /// Stored data references a type no resolver can produce. Fatal for
    /// that subtree; the caller may skip the offending child and continue
    /// with siblings.
    #[error("cannot resolve stored type {type_tag:?}")]
    Reconstruction { type_tag: String },

    /// The object has been closed; no further mutation is permitted.
    #[error("object is closed")]
    Closed,

    /// The object is already related to a storage context.
    #[error("object is already inserted into a context")]
    AlreadyInserted,

    /// A schema declaration is invalid (e.g. duplicate descriptor names).
    #[error("invalid schema: {reason}")]
    Schema { reason: String },

    /// The storage context reported an error.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Convenience type alias for persistent-object operations.
pub type PersistResult<T> = std::result::Result<T, PersistError>;
