//! Schema resolution for reconstructing typed objects from stored data.
//!
//! Reconstruction is driven by the stored `type` tag: a [`TypeResolver`]
//! maps tags to schemas, and [`PersistentObject::reconstruct`] walks the
//! stored tree resolving each child through it. Resolution is an explicit
//! capability passed by the caller rather than ambient global state.
//!
//! [`PersistentObject::reconstruct`]: crate::PersistentObject::reconstruct

use std::collections::HashMap;
use std::sync::Arc;

use statekit_registry::ComponentRegistry;

use crate::descriptor::Schema;

/// Maps stable type tags to schemas during reconstruction.
pub trait TypeResolver: Send + Sync {
    /// Resolve a stored type tag to its schema, or `None` when the tag is
    /// unknown to this resolver.
    fn resolve(&self, type_tag: &str) -> Option<Arc<Schema>>;
}

/// A fixed tag-to-schema table.
#[derive(Default, Clone)]
pub struct SchemaMap {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema under its own type tag.
    pub fn insert(&mut self, schema: Arc<Schema>) {
        self.schemas.insert(schema.type_tag().to_string(), schema);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, schema: Arc<Schema>) -> Self {
        self.insert(schema);
        self
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl TypeResolver for SchemaMap {
    fn resolve(&self, type_tag: &str) -> Option<Arc<Schema>> {
        self.schemas.get(type_tag).cloned()
    }
}

/// Resolves schemas published as components in a [`ComponentRegistry`],
/// tagged with their type tag.
pub struct RegistryResolver {
    registry: Arc<ComponentRegistry>,
}

impl RegistryResolver {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }
}

impl TypeResolver for RegistryResolver {
    fn resolve(&self, type_tag: &str) -> Option<Arc<Schema>> {
        self.registry.get_component_by_type::<Schema>(type_tag)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PropertyDescriptor;
    use crate::object::PersistentObject;
    use proptest::prelude::*;
    use serde_json::json;
    use statekit_types::{KEY_TYPE, KEY_UUID};

    fn node_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("node")
                .property(PropertyDescriptor::new("name").with_default(json!("")))
                .property(PropertyDescriptor::new("weight").with_default(json!(0)))
                .relationship("children")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn schema_map_resolves_registered_tags() {
        let resolver = SchemaMap::new().with(node_schema());
        assert!(resolver.resolve("node").is_some());
        assert!(resolver.resolve("edge").is_none());
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn registry_resolver_uses_component_registry() {
        let registry = Arc::new(ComponentRegistry::new());
        registry
            .register(node_schema(), ["node"])
            .unwrap();
        let resolver = RegistryResolver::new(registry);
        assert_eq!(resolver.resolve("node").unwrap().type_tag(), "node");
        assert!(resolver.resolve("edge").is_none());
    }

    #[test]
    fn round_trip_preserves_tree_and_identity() {
        let schema = node_schema();
        let resolver = SchemaMap::new().with(Arc::clone(&schema));

        let mut root = PersistentObject::new(Arc::clone(&schema));
        root.set_property("name", json!("root")).unwrap();
        let mut child = PersistentObject::new(Arc::clone(&schema));
        child.set_property("name", json!("child")).unwrap();
        child.set_property("weight", json!(7)).unwrap();
        let child_id = child.id();
        root.append_item("children", child).unwrap();

        let dict = root.write_to_dict().unwrap();
        let restored = PersistentObject::reconstruct(&dict, &resolver).unwrap();

        assert_eq!(restored.id(), root.id());
        assert_eq!(restored, root);
        assert_eq!(restored.relationship("children").unwrap()[0].id(), child_id);
    }

    #[test]
    fn round_trip_preserves_unknown_keys() {
        let schema = node_schema();
        let resolver = SchemaMap::new().with(Arc::clone(&schema));

        let mut dict = PersistentObject::new(Arc::clone(&schema))
            .write_to_dict()
            .unwrap();
        dict.insert("future_field".to_string(), json!({"nested": true}));

        let restored = PersistentObject::reconstruct(&dict, &resolver).unwrap();
        let rewritten = restored.write_to_dict().unwrap();
        assert_eq!(rewritten.get("future_field"), Some(&json!({"nested": true})));
    }

    #[test]
    fn unresolvable_tag_is_an_error() {
        let resolver = SchemaMap::new();
        let mut dict = statekit_types::StoredDict::new();
        dict.insert(KEY_TYPE.to_string(), json!("mystery"));
        dict.insert(
            KEY_UUID.to_string(),
            json!(statekit_types::ObjectId::new().to_string()),
        );
        let err = PersistentObject::reconstruct(&dict, &resolver).unwrap_err();
        assert!(matches!(
            err,
            crate::PersistError::Reconstruction { type_tag } if type_tag == "mystery"
        ));
    }

    proptest! {
        #[test]
        fn round_trip_preserves_property_values(
            name in "[a-z]{0,12}",
            weight in -1_000_000i64..1_000_000,
        ) {
            let schema = node_schema();
            let resolver = SchemaMap::new().with(Arc::clone(&schema));

            let mut object = PersistentObject::new(Arc::clone(&schema));
            object.set_property("name", json!(name)).unwrap();
            object.set_property("weight", json!(weight)).unwrap();

            let dict = object.write_to_dict().unwrap();
            let restored = PersistentObject::reconstruct(&dict, &resolver).unwrap();
            prop_assert_eq!(restored.property("name").unwrap(), &json!(name));
            prop_assert_eq!(restored.property("weight").unwrap(), &json!(weight));
        }
    }
}
