//! The [`StorageContext`] trait defining the storage boundary consumed by
//! the persistence core.
//!
//! Any backend (in-memory, JSON file, document store) implements this trait
//! to receive incremental writes from persistent objects and to serve their
//! stored representations back for reconstruction.

use statekit_types::{ObjectId, StoredDict, StoredValue};

use crate::error::StoreResult;

/// Durable storage for a tree of dict-like records.
///
/// Implementations must be thread-safe (`Send + Sync`). The persistence
/// core serializes access per object graph; distinct graphs may write to
/// distinct contexts concurrently.
///
/// Child dicts passed to [`set_item`](Self::set_item) and
/// [`insert_item`](Self::insert_item) are full nested subtrees as produced
/// by the persistence layer; every object dict carries its identity under
/// the `uuid` bookkeeping key.
pub trait StorageContext: Send + Sync {
    /// Register a root object (a full nested dict) with the context.
    ///
    /// Fails if an object with the same identity is already stored.
    fn insert_root(&self, dict: StoredDict) -> StoreResult<()>;

    /// Remove a root object and its entire subtree.
    fn remove_root(&self, object_id: ObjectId) -> StoreResult<()>;

    /// Write a single property value on a stored object.
    fn set_property(&self, object_id: ObjectId, key: &str, value: StoredValue) -> StoreResult<()>;

    /// Remove a property key from a stored object.
    ///
    /// Removing an absent key is a no-op.
    fn clear_property(&self, object_id: ObjectId, key: &str) -> StoreResult<()>;

    /// Write several property values in one round trip (the delayed-write
    /// flush path).
    fn update_properties(&self, object_id: ObjectId, deltas: StoredDict) -> StoreResult<()>;

    /// Assign or clear a to-one child slot.
    ///
    /// Replacing or clearing a slot removes the previous child's subtree.
    fn set_item(&self, object_id: ObjectId, key: &str, child: Option<StoredDict>)
        -> StoreResult<()>;

    /// Insert a child subtree into an ordered relationship at `index`,
    /// shifting subsequent positions up by one.
    fn insert_item(
        &self,
        object_id: ObjectId,
        key: &str,
        index: usize,
        child: StoredDict,
    ) -> StoreResult<()>;

    /// Remove the child at `index` from an ordered relationship, shifting
    /// subsequent positions down by one and deleting the child's subtree.
    fn remove_item(&self, object_id: ObjectId, key: &str, index: usize) -> StoreResult<()>;

    /// The current persisted representation of an object (full nested
    /// dict), or `None` if the object is not stored.
    fn get_storage_dict(&self, object_id: ObjectId) -> StoreResult<Option<StoredDict>>;
}
