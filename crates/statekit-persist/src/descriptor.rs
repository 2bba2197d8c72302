//! Declarative persistence metadata: schemas and field descriptors.
//!
//! A [`Schema`] describes one persistent type: its stable type tag plus a
//! descriptor per persisted field. Descriptor names are storage keys; they
//! must be unique within the schema and stable across versions (renaming
//! requires an explicit migration, which is out of scope here).

use std::sync::Arc;

use statekit_types::StoredValue;

use crate::error::{PersistError, PersistResult};

/// Bidirectional transform between the in-memory value and its stored
/// form (e.g. a structured value flattened to a string).
pub trait ValueConverter: Send + Sync {
    /// In-memory form to stored form.
    fn to_stored(&self, value: &StoredValue) -> Result<StoredValue, String>;
    /// Stored form back to in-memory form.
    fn from_stored(&self, stored: &StoredValue) -> Result<StoredValue, String>;
}

/// Predicate/normalizer applied when a property is written.
///
/// Returns the normalized value to store, or a rejection reason.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &StoredValue) -> Result<StoredValue, String>;
}

impl<F> Validator for F
where
    F: Fn(&StoredValue) -> Result<StoredValue, String> + Send + Sync,
{
    fn validate(&self, value: &StoredValue) -> Result<StoredValue, String> {
        self(value)
    }
}

/// Declares one persisted scalar field.
#[derive(Clone)]
pub struct PropertyDescriptor {
    /// Storage key, unique within the owning schema.
    pub key: String,
    /// Value applied when the object is created fresh or the key is absent
    /// from stored data.
    pub default: StoredValue,
    /// Optional value↔storable transform.
    pub converter: Option<Arc<dyn ValueConverter>>,
    /// Optional write-time predicate/normalizer.
    pub validator: Option<Arc<dyn Validator>>,
    /// Excluded from change-equality checks (but still stored).
    pub hidden: bool,
    /// Name the property-changed notification fires under; `None`
    /// suppresses the notification entirely.
    pub changed_notifier: Option<String>,
}

impl PropertyDescriptor {
    /// A property with a null default that notifies under its own key.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            changed_notifier: Some(key.clone()),
            key,
            default: StoredValue::Null,
            converter: None,
            validator: None,
            hidden: false,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: StoredValue) -> Self {
        self.default = default;
        self
    }

    /// Attach a converter.
    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Attach a validator.
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Exclude the property from change-equality checks.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Fire the property-changed notification under a different name.
    pub fn with_changed_notifier(mut self, name: impl Into<String>) -> Self {
        self.changed_notifier = Some(name.into());
        self
    }

    /// Suppress the property-changed notification.
    pub fn without_notifier(mut self) -> Self {
        self.changed_notifier = None;
        self
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("key", &self.key)
            .field("default", &self.default)
            .field("hidden", &self.hidden)
            .field("has_converter", &self.converter.is_some())
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Declares one to-one child slot.
#[derive(Clone, Debug)]
pub struct ItemDescriptor {
    /// Storage key, unique within the owning schema.
    pub key: String,
}

/// Declares one ordered to-many child collection. The storage key encodes
/// position: a child's index in the list is its stored position.
#[derive(Clone, Debug)]
pub struct RelationshipDescriptor {
    /// Storage key, unique within the owning schema.
    pub key: String,
}

/// Declarative metadata for one persistent type.
#[derive(Clone, Debug)]
pub struct Schema {
    type_tag: String,
    properties: Vec<PropertyDescriptor>,
    items: Vec<ItemDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
}

impl Schema {
    /// Start building a schema for the given stable type tag.
    pub fn builder(type_tag: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            type_tag: type_tag.into(),
            properties: Vec::new(),
            items: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// The stable type tag used for polymorphic reconstruction.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Declared property descriptors, in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Declared item descriptors, in declaration order.
    pub fn items(&self) -> &[ItemDescriptor] {
        &self.items
    }

    /// Declared relationship descriptors, in declaration order.
    pub fn relationships(&self) -> &[RelationshipDescriptor] {
        &self.relationships
    }

    /// Look up a property descriptor by storage key.
    pub fn property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Look up an item descriptor by storage key.
    pub fn item(&self, key: &str) -> Option<&ItemDescriptor> {
        self.items.iter().find(|i| i.key == key)
    }

    /// Look up a relationship descriptor by storage key.
    pub fn relationship(&self, key: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.key == key)
    }

    /// Whether any descriptor (of any kind) uses this storage key.
    pub fn declares(&self, key: &str) -> bool {
        self.property(key).is_some() || self.item(key).is_some() || self.relationship(key).is_some()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    type_tag: String,
    properties: Vec<PropertyDescriptor>,
    items: Vec<ItemDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
}

impl SchemaBuilder {
    /// Declare a property.
    pub fn property(mut self, descriptor: PropertyDescriptor) -> Self {
        self.properties.push(descriptor);
        self
    }

    /// Declare a to-one child slot.
    pub fn item(mut self, key: impl Into<String>) -> Self {
        self.items.push(ItemDescriptor { key: key.into() });
        self
    }

    /// Declare an ordered to-many child collection.
    pub fn relationship(mut self, key: impl Into<String>) -> Self {
        self.relationships.push(RelationshipDescriptor { key: key.into() });
        self
    }

    /// Finish the schema, checking descriptor-name uniqueness.
    pub fn build(self) -> PersistResult<Schema> {
        let mut seen = std::collections::HashSet::new();
        let keys = self
            .properties
            .iter()
            .map(|p| p.key.as_str())
            .chain(self.items.iter().map(|i| i.key.as_str()))
            .chain(self.relationships.iter().map(|r| r.key.as_str()));
        for key in keys {
            if !seen.insert(key) {
                return Err(PersistError::Schema {
                    reason: format!("duplicate descriptor name {key:?}"),
                });
            }
            if matches!(
                key,
                statekit_types::KEY_TYPE | statekit_types::KEY_UUID | statekit_types::KEY_MODIFIED
            ) {
                return Err(PersistError::Schema {
                    reason: format!("descriptor name {key:?} collides with a bookkeeping key"),
                });
            }
        }
        Ok(Schema {
            type_tag: self.type_tag,
            properties: self.properties,
            items: self.items,
            relationships: self.relationships,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_descriptors_in_order() {
        let schema = Schema::builder("library_item")
            .property(PropertyDescriptor::new("name").with_default(json!("")))
            .property(PropertyDescriptor::new("rank").with_default(json!(0)).hidden())
            .item("source")
            .relationship("children")
            .build()
            .unwrap();

        assert_eq!(schema.type_tag(), "library_item");
        assert_eq!(schema.properties().len(), 2);
        assert!(schema.property("rank").unwrap().hidden);
        assert!(schema.item("source").is_some());
        assert!(schema.relationship("children").is_some());
        assert!(schema.declares("name"));
        assert!(!schema.declares("missing"));
    }

    #[test]
    fn duplicate_names_are_rejected_across_kinds() {
        let err = Schema::builder("t")
            .property(PropertyDescriptor::new("name"))
            .item("name")
            .build()
            .unwrap_err();
        assert!(matches!(err, PersistError::Schema { .. }));
    }

    #[test]
    fn bookkeeping_keys_are_reserved() {
        let err = Schema::builder("t")
            .property(PropertyDescriptor::new("uuid"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PersistError::Schema { .. }));
    }

    #[test]
    fn notifier_defaults_to_key_and_can_be_suppressed() {
        let plain = PropertyDescriptor::new("name");
        assert_eq!(plain.changed_notifier.as_deref(), Some("name"));
        let silent = PropertyDescriptor::new("name").without_notifier();
        assert!(silent.changed_notifier.is_none());
        let renamed = PropertyDescriptor::new("name").with_changed_notifier("title_changed");
        assert_eq!(renamed.changed_notifier.as_deref(), Some("title_changed"));
    }
}
