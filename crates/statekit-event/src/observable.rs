//! The observable contract: the five canonical change notifications any
//! model object may expose.
//!
//! Payloads carry owned data (names, indices, object identities, stored
//! values) rather than references into the mutating object, so listeners
//! always observe fully applied post-mutation state.

use serde::{Deserialize, Serialize};

use statekit_types::{ObjectId, StoredValue};

use crate::event::{Event, EventListener};

/// A declared property changed value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyChanged {
    /// Storage key of the property.
    pub name: String,
    /// The new value, in stored form.
    pub value: StoredValue,
}

/// A to-one child slot was assigned.
///
/// Fired for every assignment, including clearing; a cleared slot also
/// fires [`ItemCleared`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSet {
    /// Storage key of the item slot.
    pub name: String,
    /// Identity of the previous child, if any.
    pub old: Option<ObjectId>,
    /// Identity of the new child, if any.
    pub new: Option<ObjectId>,
}

/// A to-one child slot was cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCleared {
    /// Storage key of the item slot.
    pub name: String,
    /// Identity of the removed child, if any.
    pub old: Option<ObjectId>,
}

/// A child was inserted into an ordered relationship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInserted {
    /// Storage key of the relationship.
    pub relationship: String,
    /// Identity of the inserted child.
    pub child: ObjectId,
    /// Position the child was inserted at.
    pub index: usize,
}

/// A child was removed from an ordered relationship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    /// Storage key of the relationship.
    pub relationship: String,
    /// Identity of the removed child.
    pub child: ObjectId,
    /// Position the child occupied before removal.
    pub index: usize,
}

/// The bundle of canonical change events.
///
/// Model objects embed one of these; the `notify_*` methods fire the
/// corresponding event after the mutation has been fully applied.
#[derive(Clone, Debug, Default)]
pub struct ObservableEvents {
    property_changed: Event<PropertyChanged>,
    item_set: Event<ItemSet>,
    item_cleared: Event<ItemCleared>,
    item_inserted: Event<ItemInserted>,
    item_removed: Event<ItemRemoved>,
}

impl ObservableEvents {
    /// Create a bundle with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for property changes.
    pub fn listen_property_changed<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&PropertyChanged) + Send + Sync + 'static,
    {
        self.property_changed.listen(handler)
    }

    /// Listen for to-one slot assignments.
    pub fn listen_item_set<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&ItemSet) + Send + Sync + 'static,
    {
        self.item_set.listen(handler)
    }

    /// Listen for to-one slot clears.
    pub fn listen_item_cleared<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&ItemCleared) + Send + Sync + 'static,
    {
        self.item_cleared.listen(handler)
    }

    /// Listen for relationship insertions.
    pub fn listen_item_inserted<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&ItemInserted) + Send + Sync + 'static,
    {
        self.item_inserted.listen(handler)
    }

    /// Listen for relationship removals.
    pub fn listen_item_removed<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&ItemRemoved) + Send + Sync + 'static,
    {
        self.item_removed.listen(handler)
    }

    /// Fire the property-changed event.
    pub fn notify_property_changed(&self, name: &str, value: StoredValue) {
        self.property_changed.fire(&PropertyChanged {
            name: name.to_string(),
            value,
        });
    }

    /// Fire the item-set event; a cleared slot (`new == None`) also fires
    /// the item-cleared event.
    pub fn notify_item_set(&self, name: &str, old: Option<ObjectId>, new: Option<ObjectId>) {
        self.item_set.fire(&ItemSet {
            name: name.to_string(),
            old,
            new,
        });
        if new.is_none() {
            self.item_cleared.fire(&ItemCleared {
                name: name.to_string(),
                old,
            });
        }
    }

    /// Fire the item-inserted event.
    pub fn notify_item_inserted(&self, relationship: &str, child: ObjectId, index: usize) {
        self.item_inserted.fire(&ItemInserted {
            relationship: relationship.to_string(),
            child,
            index,
        });
    }

    /// Fire the item-removed event.
    pub fn notify_item_removed(&self, relationship: &str, child: ObjectId, index: usize) {
        self.item_removed.fire(&ItemRemoved {
            relationship: relationship.to_string(),
            child,
            index,
        });
    }
}

/// Capability trait for objects exposing the canonical change events.
pub trait Observable {
    /// The object's change-event bundle.
    fn observable(&self) -> &ObservableEvents;
}
