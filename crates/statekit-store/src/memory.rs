//! In-memory storage context for tests and ephemeral use.
//!
//! [`MemoryStorageContext`] keeps one flat [`StoredRecord`] per object in a
//! `HashMap` behind a `RwLock`. Nested child dicts are flattened on ingest
//! and reconstituted by [`get_storage_dict`](StorageContext::get_storage_dict).
//! Data is lost when the context is dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use statekit_types::{object_id_of, ObjectId, StoredDict, StoredValue};

use crate::error::{StoreError, StoreResult};
use crate::record::{self, StoredRecord};
use crate::traits::StorageContext;

#[derive(Default)]
struct MemoryState {
    records: HashMap<ObjectId, StoredRecord>,
    /// Root identities in registration order.
    roots: Vec<ObjectId>,
}

impl MemoryState {
    fn record(&self, id: ObjectId) -> StoreResult<&StoredRecord> {
        self.records
            .get(&id)
            .ok_or(StoreError::ObjectNotFound { id })
    }

    fn record_mut(&mut self, id: ObjectId) -> StoreResult<&mut StoredRecord> {
        self.records
            .get_mut(&id)
            .ok_or(StoreError::ObjectNotFound { id })
    }

    /// Flatten a nested dict and commit its records, rejecting identity
    /// collisions before anything is inserted.
    fn ingest(&mut self, dict: StoredDict) -> StoreResult<ObjectId> {
        let mut flattened = Vec::new();
        let id = record::flatten(dict, &mut flattened)?;
        for (record_id, _) in &flattened {
            if self.records.contains_key(record_id) {
                return Err(StoreError::DuplicateObject { id: *record_id });
            }
        }
        for (record_id, record) in flattened {
            self.records.insert(record_id, record);
        }
        Ok(id)
    }

    /// Delete an object's record and its entire subtree.
    fn evict(&mut self, id: ObjectId) -> StoreResult<()> {
        let record = self.record(id)?.clone();
        let lookup = |child: ObjectId| self.record(child).cloned();
        let ids = record::descendants(&record, &lookup)?;
        for child in ids {
            self.records.remove(&child);
        }
        self.records.remove(&id);
        Ok(())
    }
}

/// In-memory, HashMap-based storage context.
///
/// Intended for tests and embedding. All records are held behind a
/// `RwLock` for safe concurrent access.
#[derive(Default)]
pub struct MemoryStorageContext {
    state: RwLock<MemoryState>,
}

impl MemoryStorageContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored (roots and descendants).
    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").records.len()
    }

    /// Returns `true` if the context holds no objects.
    pub fn is_empty(&self) -> bool {
        self.state.read().expect("lock poisoned").records.is_empty()
    }

    /// Root identities in registration order.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.state.read().expect("lock poisoned").roots.clone()
    }

    /// Remove all records.
    pub fn clear(&self) {
        let mut state = self.state.write().expect("lock poisoned");
        state.records.clear();
        state.roots.clear();
    }
}

impl StorageContext for MemoryStorageContext {
    fn insert_root(&self, dict: StoredDict) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let id = state.ingest(dict)?;
        state.roots.push(id);
        debug!(%id, "root inserted");
        Ok(())
    }

    fn remove_root(&self, object_id: ObjectId) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        if !state.roots.contains(&object_id) {
            return Err(StoreError::ObjectNotFound { id: object_id });
        }
        state.evict(object_id)?;
        state.roots.retain(|r| *r != object_id);
        debug!(id = %object_id, "root removed");
        Ok(())
    }

    fn set_property(&self, object_id: ObjectId, key: &str, value: StoredValue) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let record = state.record_mut(object_id)?;
        record.properties.insert(key.to_string(), value);
        Ok(())
    }

    fn clear_property(&self, object_id: ObjectId, key: &str) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let record = state.record_mut(object_id)?;
        record.properties.remove(key);
        Ok(())
    }

    fn update_properties(&self, object_id: ObjectId, deltas: StoredDict) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let record = state.record_mut(object_id)?;
        for (key, value) in deltas {
            record.properties.insert(key, value);
        }
        Ok(())
    }

    fn set_item(
        &self,
        object_id: ObjectId,
        key: &str,
        child: Option<StoredDict>,
    ) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let previous = state
            .record(object_id)?
            .items
            .get(key)
            .copied()
            .flatten();
        // Flatten and collision-check the incoming subtree before evicting
        // the current child, so a failure leaves the stored state unchanged.
        let flattened = match child {
            Some(dict) => {
                if object_id_of(&dict).is_none() {
                    return Err(StoreError::MissingIdentity {
                        key: key.to_string(),
                    });
                }
                let mut flattened = Vec::new();
                let id = record::flatten(dict, &mut flattened)?;
                let mut replaced = match previous {
                    Some(old_id) => {
                        let old = state.record(old_id)?.clone();
                        let lookup = |child: ObjectId| state.record(child).cloned();
                        record::descendants(&old, &lookup)?
                    }
                    None => Vec::new(),
                };
                replaced.extend(previous);
                for (record_id, _) in &flattened {
                    if state.records.contains_key(record_id) && !replaced.contains(record_id) {
                        return Err(StoreError::DuplicateObject { id: *record_id });
                    }
                }
                Some((id, flattened))
            }
            None => None,
        };
        if let Some(old_id) = previous {
            state.evict(old_id)?;
        }
        let new_id = match flattened {
            Some((id, records)) => {
                for (record_id, record) in records {
                    state.records.insert(record_id, record);
                }
                Some(id)
            }
            None => None,
        };
        state
            .record_mut(object_id)?
            .items
            .insert(key.to_string(), new_id);
        Ok(())
    }

    fn insert_item(
        &self,
        object_id: ObjectId,
        key: &str,
        index: usize,
        child: StoredDict,
    ) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let len = state
            .record(object_id)?
            .relationships
            .get(key)
            .map_or(0, Vec::len);
        if index > len {
            return Err(StoreError::IndexOutOfRange {
                key: key.to_string(),
                index,
                len,
            });
        }
        let child_id = state.ingest(child)?;
        state
            .record_mut(object_id)?
            .relationships
            .entry(key.to_string())
            .or_default()
            .insert(index, child_id);
        Ok(())
    }

    fn remove_item(&self, object_id: ObjectId, key: &str, index: usize) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let record = state.record(object_id)?;
        let children = record.relationships.get(key).ok_or_else(|| {
            StoreError::UnknownRelationship {
                id: object_id,
                key: key.to_string(),
            }
        })?;
        let len = children.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange {
                key: key.to_string(),
                index,
                len,
            });
        }
        let child_id = children[index];
        state.evict(child_id)?;
        state
            .record_mut(object_id)?
            .relationships
            .get_mut(key)
            .expect("relationship checked above")
            .remove(index);
        Ok(())
    }

    fn get_storage_dict(&self, object_id: ObjectId) -> StoreResult<Option<StoredDict>> {
        let state = self.state.read().expect("lock poisoned");
        let Some(record) = state.records.get(&object_id) else {
            return Ok(None);
        };
        let lookup = |id: ObjectId| state.record(id).cloned();
        record::nest(record, &lookup).map(Some)
    }
}

impl std::fmt::Debug for MemoryStorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("MemoryStorageContext")
            .field("record_count", &state.records.len())
            .field("root_count", &state.roots.len())
            .finish()
    }
}
