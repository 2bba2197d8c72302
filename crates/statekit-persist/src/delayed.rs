//! Delayed-write accumulation: pending deltas that coalesce into one
//! storage round trip.
//!
//! While an object is inside a delay scope, property deltas coalesce per
//! key (last write wins) and structural operations queue in order with
//! their child dicts captured at queue time. On flush the structural queue
//! replays first, then the property deltas go out as one batched update —
//! so a removal queued after an insert renumbers exactly as it did in
//! memory.

use statekit_types::{ObjectId, StoredDict, StoredValue};

use statekit_store::{StorageContext, StoreResult};

/// A queued structural operation.
#[derive(Clone, Debug)]
pub enum StructuralOp {
    /// Assign or clear a to-one slot.
    SetItem {
        key: String,
        child: Option<StoredDict>,
    },
    /// Insert into an ordered relationship.
    InsertItem {
        key: String,
        index: usize,
        child: StoredDict,
    },
    /// Remove from an ordered relationship.
    RemoveItem { key: String, index: usize },
}

/// Deltas accumulated during a delay scope.
#[derive(Clone, Debug, Default)]
pub struct PendingWrites {
    structural: Vec<StructuralOp>,
    properties: StoredDict,
}

impl PendingWrites {
    /// Whether anything is queued.
    pub fn is_empty(&self) -> bool {
        self.structural.is_empty() && self.properties.is_empty()
    }

    /// Coalesce a property delta (last write wins).
    pub fn push_property(&mut self, key: &str, value: StoredValue) {
        self.properties.insert(key.to_string(), value);
    }

    /// Queue a structural operation.
    pub fn push_structural(&mut self, op: StructuralOp) {
        self.structural.push(op);
    }

    /// Replay everything against the context as one batch: structural
    /// operations in order, then the coalesced property deltas in a single
    /// call. The queue drains only on success; a failed replay leaves the
    /// remaining deltas queued.
    pub fn flush(&mut self, context: &dyn StorageContext, object_id: ObjectId) -> StoreResult<()> {
        while let Some(op) = self.structural.first().cloned() {
            match op {
                StructuralOp::SetItem { key, child } => {
                    context.set_item(object_id, &key, child)?;
                }
                StructuralOp::InsertItem { key, index, child } => {
                    context.insert_item(object_id, &key, index, child)?;
                }
                StructuralOp::RemoveItem { key, index } => {
                    context.remove_item(object_id, &key, index)?;
                }
            }
            self.structural.remove(0);
        }
        if !self.properties.is_empty() {
            context.update_properties(object_id, self.properties.clone())?;
            self.properties.clear();
        }
        Ok(())
    }
}
