//! The persistent object: descriptor-mediated state with dirty tracking,
//! incremental writes, and a close lifecycle.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use statekit_event::{Observable, ObservableEvents};
use statekit_store::StorageContext;
use statekit_types::{
    object_id_of, type_tag_of, ObjectId, StoredDict, StoredValue, KEY_MODIFIED, KEY_TYPE, KEY_UUID,
};

use crate::delayed::{PendingWrites, StructuralOp};
use crate::descriptor::Schema;
use crate::error::{PersistError, PersistResult};
use crate::reconstruct::TypeResolver;

/// A typed object exposing properties, to-one items, and ordered to-many
/// relationships to a storage context.
///
/// All mutation goes through descriptor-mediated operations that validate,
/// apply, mark dirty, forward the delta to the context (or queue it under a
/// delay scope), and then notify listeners. The object owns its children;
/// the storage context is a non-owning back-reference. After
/// [`close`](Self::close), no further mutation is permitted.
pub struct PersistentObject {
    schema: Arc<Schema>,
    id: ObjectId,
    values: HashMap<String, StoredValue>,
    items: HashMap<String, Option<Box<PersistentObject>>>,
    relationships: HashMap<String, Vec<PersistentObject>>,
    events: ObservableEvents,
    modification_count: u64,
    dirty: BTreeSet<String>,
    pending: PendingWrites,
    delay_depth: u32,
    /// Set when the object was attached under an ancestor's open delay
    /// scope; cleared when that scope flushes.
    inherited_delay: bool,
    context: Option<Weak<dyn StorageContext>>,
    ever_inserted: bool,
    closed: bool,
    force_notify: bool,
    /// Stored keys with no matching descriptor, preserved verbatim for
    /// round-trip fidelity with newer schema versions.
    unknown: StoredDict,
    modified: DateTime<Utc>,
}

impl PersistentObject {
    /// Create a fresh object with defaults applied.
    pub fn new(schema: Arc<Schema>) -> Self {
        let mut values = HashMap::new();
        for property in schema.properties() {
            values.insert(property.key.clone(), property.default.clone());
        }
        let mut items = HashMap::new();
        for item in schema.items() {
            items.insert(item.key.clone(), None);
        }
        let mut relationships = HashMap::new();
        for relationship in schema.relationships() {
            relationships.insert(relationship.key.clone(), Vec::new());
        }
        Self {
            schema,
            id: ObjectId::new(),
            values,
            items,
            relationships,
            events: ObservableEvents::new(),
            modification_count: 0,
            dirty: BTreeSet::new(),
            pending: PendingWrites::default(),
            delay_depth: 0,
            inherited_delay: false,
            context: None,
            ever_inserted: false,
            closed: false,
            force_notify: false,
            unknown: StoredDict::new(),
            modified: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The object's storage identity.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The object's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The stable type tag.
    pub fn type_tag(&self) -> &str {
        self.schema.type_tag()
    }

    /// Monotonic count of applied mutations.
    pub fn modification_count(&self) -> u64 {
        self.modification_count
    }

    /// Property keys whose in-memory value has changed since the last
    /// successful write.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.dirty.iter().map(String::as_str)
    }

    /// Whether the object has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the object is currently related to a storage context.
    pub fn is_inserted(&self) -> bool {
        self.context.is_some()
    }

    /// Whether deltas are queued under an open delay scope.
    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// When `true`, equal-value property writes still apply and notify.
    pub fn set_force_notify(&mut self, force: bool) {
        self.force_notify = force;
    }

    /// Current in-memory value of a declared property.
    pub fn property(&self, name: &str) -> PersistResult<&StoredValue> {
        let descriptor = self
            .schema
            .property(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        Ok(self.values.get(name).unwrap_or(&descriptor.default))
    }

    /// Current child in a declared to-one slot.
    pub fn item(&self, name: &str) -> PersistResult<Option<&PersistentObject>> {
        self.schema
            .item(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        Ok(self.items.get(name).and_then(|c| c.as_deref()))
    }

    /// Mutable access to a declared to-one child.
    pub fn item_mut(&mut self, name: &str) -> PersistResult<Option<&mut PersistentObject>> {
        self.schema
            .item(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        Ok(self.items.get_mut(name).and_then(|c| c.as_deref_mut()))
    }

    /// Current children of a declared relationship, in position order.
    pub fn relationship(&self, name: &str) -> PersistResult<&[PersistentObject]> {
        self.schema
            .relationship(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        Ok(self
            .relationships
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Mutable access to the relationship child at `index`.
    pub fn child_mut(&mut self, name: &str, index: usize) -> PersistResult<&mut PersistentObject> {
        self.schema
            .relationship(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        let children = self
            .relationships
            .get_mut(name)
            .map(Vec::as_mut_slice)
            .unwrap_or_default();
        let len = children.len();
        children
            .get_mut(index)
            .ok_or(PersistError::IndexOutOfRange {
                key: name.to_string(),
                index,
                len,
            })
    }

    // -----------------------------------------------------------------------
    // Property mutation
    // -----------------------------------------------------------------------

    /// Write a declared property.
    ///
    /// Validates and normalizes the value, applies it, marks the key dirty,
    /// forwards the single-key delta to the context (or queues it under a
    /// delay scope), then fires the property's changed notification with
    /// the post-mutation value. Writing an equal value is a no-op unless
    /// force-notify is set.
    pub fn set_property(&mut self, name: &str, value: StoredValue) -> PersistResult<()> {
        self.ensure_open()?;
        let descriptor = self
            .schema
            .property(name)
            .cloned()
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;

        let normalized = match &descriptor.validator {
            Some(validator) => {
                validator
                    .validate(&value)
                    .map_err(|reason| PersistError::Validation {
                        key: name.to_string(),
                        reason,
                    })?
            }
            None => value,
        };

        let current = self.values.get(name).unwrap_or(&descriptor.default);
        if !self.force_notify && *current == normalized {
            return Ok(());
        }

        // Convert before applying so a converter failure leaves state
        // untouched.
        let stored = match &descriptor.converter {
            Some(converter) => converter.to_stored(&normalized).map_err(|reason| {
                PersistError::Conversion {
                    key: name.to_string(),
                    reason,
                }
            })?,
            None => normalized.clone(),
        };

        self.values.insert(name.to_string(), normalized.clone());
        self.touch();
        self.dirty.insert(name.to_string());

        if let Some(context) = self.context() {
            if self.is_delayed() {
                self.pending.push_property(name, stored);
            } else {
                context.set_property(self.id, name, stored)?;
                self.dirty.remove(name);
            }
        }

        if let Some(notifier) = &descriptor.changed_notifier {
            self.events.notify_property_changed(notifier, normalized);
        }
        Ok(())
    }

    /// Reset a declared property to its descriptor default, removing the
    /// stored key. Resetting an already-default property is a no-op unless
    /// force-notify is set.
    pub fn clear_property(&mut self, name: &str) -> PersistResult<()> {
        self.ensure_open()?;
        let descriptor = self
            .schema
            .property(name)
            .cloned()
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;

        let current = self.values.get(name).unwrap_or(&descriptor.default);
        if !self.force_notify && *current == descriptor.default {
            return Ok(());
        }

        let stored = match &descriptor.converter {
            Some(converter) => converter.to_stored(&descriptor.default).map_err(|reason| {
                PersistError::Conversion {
                    key: name.to_string(),
                    reason,
                }
            })?,
            None => descriptor.default.clone(),
        };

        self.values
            .insert(name.to_string(), descriptor.default.clone());
        self.touch();
        self.dirty.insert(name.to_string());

        if let Some(context) = self.context() {
            if self.is_delayed() {
                // a queued delta for this key is superseded by the default
                self.pending.push_property(name, stored);
            } else {
                context.clear_property(self.id, name)?;
                self.dirty.remove(name);
            }
        }

        if let Some(notifier) = &descriptor.changed_notifier {
            self.events
                .notify_property_changed(notifier, descriptor.default.clone());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Items (to-one)
    // -----------------------------------------------------------------------

    /// Assign a to-one child slot, closing and detaching any previous
    /// child. Fires the item-set notification (and item-cleared when
    /// `child` is `None`).
    pub fn set_item(&mut self, name: &str, child: Option<PersistentObject>) -> PersistResult<()> {
        self.ensure_open()?;
        self.schema
            .item(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        if child.as_ref().is_some_and(|c| c.closed) {
            return Err(PersistError::Closed);
        }

        let old_id = self
            .items
            .get(name)
            .and_then(|c| c.as_ref())
            .map(|c| c.id);
        let new_id = child.as_ref().map(|c| c.id);

        let mut child = child;
        if let Some(context) = self.context() {
            let weak = Arc::downgrade(&context);
            let delayed = self.is_delayed();
            let child_dict = match &mut child {
                Some(c) => {
                    c.attach_subtree(&weak, delayed);
                    Some(c.write_to_dict()?)
                }
                None => None,
            };
            if delayed {
                self.pending.push_structural(StructuralOp::SetItem {
                    key: name.to_string(),
                    child: child_dict,
                });
            } else {
                context.set_item(self.id, name, child_dict)?;
            }
        }

        if let Some(mut previous) = self.items.insert(name.to_string(), child.map(Box::new)).flatten()
        {
            previous.close_without_flush();
        }
        self.touch();
        self.events.notify_item_set(name, old_id, new_id);
        Ok(())
    }

    /// Clear a to-one child slot.
    pub fn clear_item(&mut self, name: &str) -> PersistResult<()> {
        self.set_item(name, None)
    }

    // -----------------------------------------------------------------------
    // Relationships (to-many)
    // -----------------------------------------------------------------------

    /// Insert a child into an ordered relationship at `index`, shifting
    /// subsequent positions up by one. Fires the item-inserted
    /// notification.
    pub fn insert_item(
        &mut self,
        name: &str,
        index: usize,
        child: PersistentObject,
    ) -> PersistResult<()> {
        self.ensure_open()?;
        self.schema
            .relationship(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        if child.closed {
            return Err(PersistError::Closed);
        }
        let len = self.relationships.get(name).map_or(0, Vec::len);
        if index > len {
            return Err(PersistError::IndexOutOfRange {
                key: name.to_string(),
                index,
                len,
            });
        }

        let mut child = child;
        let child_id = child.id;
        if let Some(context) = self.context() {
            let weak = Arc::downgrade(&context);
            let delayed = self.is_delayed();
            child.attach_subtree(&weak, delayed);
            let child_dict = child.write_to_dict()?;
            if delayed {
                self.pending.push_structural(StructuralOp::InsertItem {
                    key: name.to_string(),
                    index,
                    child: child_dict,
                });
            } else {
                context.insert_item(self.id, name, index, child_dict)?;
            }
        }

        self.relationships
            .entry(name.to_string())
            .or_default()
            .insert(index, child);
        self.touch();
        self.events.notify_item_inserted(name, child_id, index);
        Ok(())
    }

    /// Append a child at the end of an ordered relationship.
    pub fn append_item(&mut self, name: &str, child: PersistentObject) -> PersistResult<()> {
        let len = self.relationships.get(name).map_or(0, Vec::len);
        self.insert_item(name, len, child)
    }

    /// Remove a child located by identity. Fires the item-removed
    /// notification with the child's original position.
    pub fn remove_item(&mut self, name: &str, child_id: ObjectId) -> PersistResult<()> {
        self.schema
            .relationship(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        let index = self
            .relationships
            .get(name)
            .and_then(|children| children.iter().position(|c| c.id == child_id))
            .ok_or(PersistError::ChildNotFound {
                key: name.to_string(),
                id: child_id,
            })?;
        self.remove_item_at(name, index)
    }

    /// Remove the child at `index`, renumbering trailing positions down by
    /// one. Fires the item-removed notification.
    pub fn remove_item_at(&mut self, name: &str, index: usize) -> PersistResult<()> {
        self.ensure_open()?;
        self.schema
            .relationship(name)
            .ok_or_else(|| PersistError::UnknownKey {
                key: name.to_string(),
            })?;
        let len = self.relationships.get(name).map_or(0, Vec::len);
        if index >= len {
            return Err(PersistError::IndexOutOfRange {
                key: name.to_string(),
                index,
                len,
            });
        }

        if let Some(context) = self.context() {
            if self.is_delayed() {
                self.pending.push_structural(StructuralOp::RemoveItem {
                    key: name.to_string(),
                    index,
                });
            } else {
                context.remove_item(self.id, name, index)?;
            }
        }

        if let Some(children) = self.relationships.get_mut(name) {
            let mut removed = children.remove(index);
            let child_id = removed.id;
            removed.close_without_flush();
            self.touch();
            self.events.notify_item_removed(name, child_id, index);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Context relation
    // -----------------------------------------------------------------------

    /// Insert this object (and its subtree) into a storage context as a
    /// root, writing the full stored representation.
    ///
    /// The context is held as a non-owning back-reference; the caller keeps
    /// the owning `Arc`.
    pub fn insert_into_context(&mut self, context: &Arc<dyn StorageContext>) -> PersistResult<()> {
        self.ensure_open()?;
        if self.context.is_some() {
            return Err(PersistError::AlreadyInserted);
        }
        let weak = Arc::downgrade(context);
        self.attach_subtree(&weak, false);
        let dict = self.write_to_dict()?;
        if let Err(err) = context.insert_root(dict) {
            self.detach_subtree();
            return Err(err.into());
        }
        self.dirty.clear();
        debug!(id = %self.id, type_tag = self.type_tag(), "inserted into context");
        Ok(())
    }

    /// Remove this root object (and its subtree) from its context. The
    /// object stays usable in memory.
    pub fn remove_from_context(&mut self) -> PersistResult<()> {
        self.ensure_open()?;
        if let Some(context) = self.context() {
            context.remove_root(self.id)?;
        }
        self.detach_subtree();
        debug!(id = %self.id, "removed from context");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Delayed writes
    // -----------------------------------------------------------------------

    /// Open a delay scope: subsequent deltas accumulate instead of going
    /// to the context. Scopes nest; only the outermost
    /// [`finish_delayed_write`](Self::finish_delayed_write) flushes.
    pub fn begin_delayed_write(&mut self) -> PersistResult<()> {
        self.ensure_open()?;
        self.delay_depth += 1;
        Ok(())
    }

    /// Close the innermost delay scope; when the outermost scope closes,
    /// queued structural operations replay in order and accumulated
    /// property deltas flush as one batched update.
    pub fn finish_delayed_write(&mut self) -> PersistResult<()> {
        self.ensure_open()?;
        if self.delay_depth == 0 {
            warn!(id = %self.id, "finish_delayed_write without matching begin");
            return Ok(());
        }
        self.delay_depth -= 1;
        if self.delay_depth == 0 {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> PersistResult<()> {
        if let Some(context) = self.context() {
            if !self.pending.is_empty() {
                self.pending.flush(context.as_ref(), self.id)?;
                self.dirty.clear();
                debug!(id = %self.id, "delayed writes flushed");
            }
            self.flush_inherited(context.as_ref())?;
        }
        Ok(())
    }

    /// Flush children that queued deltas because they were attached while
    /// this object's delay scope was open.
    fn flush_inherited(&mut self, context: &dyn StorageContext) -> PersistResult<()> {
        for child in self.children_mut() {
            if child.inherited_delay {
                child.inherited_delay = false;
                if child.delay_depth == 0 && !child.pending.is_empty() {
                    child.pending.flush(context, child.id)?;
                    child.dirty.clear();
                }
            }
            child.flush_inherited(context)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Close lifecycle
    // -----------------------------------------------------------------------

    /// Close the object: flush any pending deltas, recursively close owned
    /// children, and detach the context relation. Idempotent; after close,
    /// mutation fails with [`PersistError::Closed`].
    pub fn close(&mut self) -> PersistResult<()> {
        if self.closed {
            return Ok(());
        }
        self.delay_depth = 0;
        self.flush_pending()?;
        for child in self.children_mut() {
            child.close()?;
        }
        self.context = None;
        self.closed = true;
        Ok(())
    }

    /// Close a child that is leaving the graph: its subtree is being
    /// deleted from storage by the parent's structural delta, so pending
    /// deltas are discarded rather than flushed.
    fn close_without_flush(&mut self) {
        self.pending = PendingWrites::default();
        self.delay_depth = 0;
        self.inherited_delay = false;
        self.context = None;
        self.closed = true;
        for child in self.children_mut() {
            child.close_without_flush();
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Produce the stored representation of this object and its subtree.
    ///
    /// Hidden properties are always written; unknown stored keys are
    /// re-emitted unchanged. Properties whose value equals the descriptor
    /// default are omitted only while the object has never been inserted —
    /// once inserted, every declared property is written so diffs stay
    /// stable.
    pub fn write_to_dict(&self) -> PersistResult<StoredDict> {
        let mut dict = self.unknown.clone();
        dict.insert(KEY_TYPE.to_string(), StoredValue::from(self.type_tag()));
        dict.insert(KEY_UUID.to_string(), StoredValue::from(self.id.to_string()));
        dict.insert(
            KEY_MODIFIED.to_string(),
            StoredValue::from(self.modified.to_rfc3339()),
        );
        for property in self.schema.properties() {
            let value = self.values.get(&property.key).unwrap_or(&property.default);
            if !self.ever_inserted && *value == property.default {
                continue;
            }
            let stored = match &property.converter {
                Some(converter) => converter.to_stored(value).map_err(|reason| {
                    PersistError::Conversion {
                        key: property.key.clone(),
                        reason,
                    }
                })?,
                None => value.clone(),
            };
            dict.insert(property.key.clone(), stored);
        }
        for item in self.schema.items() {
            if let Some(child) = self.items.get(&item.key).and_then(|c| c.as_deref()) {
                dict.insert(item.key.clone(), StoredValue::Object(child.write_to_dict()?));
            }
        }
        for relationship in self.schema.relationships() {
            let children = self
                .relationships
                .get(&relationship.key)
                .map(Vec::as_slice).unwrap_or_default();
            let mut list = Vec::with_capacity(children.len());
            for child in children {
                list.push(StoredValue::Object(child.write_to_dict()?));
            }
            dict.insert(relationship.key.clone(), StoredValue::Array(list));
        }
        Ok(dict)
    }

    /// Reconstruct an object of a known schema from its stored
    /// representation, resolving polymorphic child types through
    /// `resolver`.
    pub fn read_from_dict(
        schema: Arc<Schema>,
        dict: &StoredDict,
        resolver: &dyn TypeResolver,
    ) -> PersistResult<Self> {
        let mut object = Self::new(Arc::clone(&schema));
        if let Some(id) = object_id_of(dict) {
            object.id = id;
        }
        if let Some(modified) = dict
            .get(KEY_MODIFIED)
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        {
            object.modified = modified.with_timezone(&Utc);
        }

        for property in schema.properties() {
            let value = match dict.get(&property.key) {
                Some(stored) => match &property.converter {
                    Some(converter) => converter.from_stored(stored).map_err(|reason| {
                        PersistError::Conversion {
                            key: property.key.clone(),
                            reason,
                        }
                    })?,
                    None => stored.clone(),
                },
                None => property.default.clone(),
            };
            object.values.insert(property.key.clone(), value);
        }

        for item in schema.items() {
            if let Some(stored) = dict.get(&item.key).and_then(|v| v.as_object()) {
                let child = Self::reconstruct_child(stored, resolver)?;
                object.items.insert(item.key.clone(), Some(Box::new(child)));
            }
        }

        for relationship in schema.relationships() {
            let mut children = Vec::new();
            if let Some(stored_list) = dict.get(&relationship.key).and_then(|v| v.as_array()) {
                for entry in stored_list {
                    let stored = entry.as_object().ok_or_else(|| {
                        PersistError::Reconstruction {
                            type_tag: "<untyped>".to_string(),
                        }
                    })?;
                    children.push(Self::reconstruct_child(stored, resolver)?);
                }
            }
            object.relationships.insert(relationship.key.clone(), children);
        }

        for (key, value) in dict {
            let bookkeeping = matches!(key.as_str(), KEY_TYPE | KEY_UUID | KEY_MODIFIED);
            if !bookkeeping && !schema.declares(key) {
                object.unknown.insert(key.clone(), value.clone());
            }
        }
        Ok(object)
    }

    /// Reconstruct an object whose schema is resolved from the stored
    /// `type` tag.
    pub fn reconstruct(dict: &StoredDict, resolver: &dyn TypeResolver) -> PersistResult<Self> {
        Self::reconstruct_child(dict, resolver)
    }

    fn reconstruct_child(dict: &StoredDict, resolver: &dyn TypeResolver) -> PersistResult<Self> {
        let tag = type_tag_of(dict).ok_or_else(|| PersistError::Reconstruction {
            type_tag: "<untyped>".to_string(),
        })?;
        let schema = resolver
            .resolve(tag)
            .ok_or_else(|| PersistError::Reconstruction {
                type_tag: tag.to_string(),
            })?;
        Self::read_from_dict(schema, dict, resolver)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> PersistResult<()> {
        if self.closed {
            Err(PersistError::Closed)
        } else {
            Ok(())
        }
    }

    fn context(&self) -> Option<Arc<dyn StorageContext>> {
        self.context.as_ref().and_then(Weak::upgrade)
    }

    fn is_delayed(&self) -> bool {
        self.delay_depth > 0 || self.inherited_delay
    }

    fn touch(&mut self) {
        self.modification_count += 1;
        self.modified = Utc::now();
    }

    fn children_mut(&mut self) -> impl Iterator<Item = &mut PersistentObject> + '_ {
        self.items
            .values_mut()
            .filter_map(|c| c.as_deref_mut())
            .chain(self.relationships.values_mut().flatten())
    }

    /// Attach this subtree to a context. `inherited_delay` marks children
    /// attached under an open delay scope so their own deltas queue until
    /// that scope flushes.
    fn attach_subtree(&mut self, context: &Weak<dyn StorageContext>, inherited_delay: bool) {
        self.context = Some(context.clone());
        self.ever_inserted = true;
        self.inherited_delay = inherited_delay;
        for child in self.children_mut() {
            child.attach_subtree(context, inherited_delay);
        }
    }

    fn detach_subtree(&mut self) {
        self.context = None;
        self.inherited_delay = false;
        for child in self.children_mut() {
            child.detach_subtree();
        }
    }
}

impl Observable for PersistentObject {
    fn observable(&self) -> &ObservableEvents {
        &self.events
    }
}

/// Equality over declared state: type tag, non-hidden property values,
/// items, and relationships. Identity, timestamps, and write bookkeeping
/// are not compared.
impl PartialEq for PersistentObject {
    fn eq(&self, other: &Self) -> bool {
        if self.type_tag() != other.type_tag() {
            return false;
        }
        for property in self.schema.properties() {
            if property.hidden {
                continue;
            }
            let mine = self.values.get(&property.key).unwrap_or(&property.default);
            let theirs = other.values.get(&property.key).unwrap_or(&property.default);
            if mine != theirs {
                return false;
            }
        }
        for item in self.schema.items() {
            let mine = self.items.get(&item.key).and_then(|c| c.as_deref());
            let theirs = other.items.get(&item.key).and_then(|c| c.as_deref());
            if mine != theirs {
                return false;
            }
        }
        for relationship in self.schema.relationships() {
            let mine = self
                .relationships
                .get(&relationship.key)
                .map(Vec::as_slice).unwrap_or_default();
            let theirs = other
                .relationships
                .get(&relationship.key)
                .map(Vec::as_slice).unwrap_or_default();
            if mine != theirs {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Debug for PersistentObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentObject")
            .field("type_tag", &self.type_tag())
            .field("id", &self.id)
            .field("modification_count", &self.modification_count)
            .field("dirty", &self.dirty)
            .field("inserted", &self.is_inserted())
            .field("closed", &self.closed)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
