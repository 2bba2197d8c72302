//! Unified API for StateKit.
//!
//! Re-exports the public surface of the StateKit crates: observable events,
//! descriptor-driven persistent objects, storage contexts, the component
//! registry, and observable value models. This is the main entry point for
//! applications embedding StateKit.

pub use statekit_event::{
    Event, EventListener, ItemCleared, ItemInserted, ItemRemoved, ItemSet, Observable,
    ObservableEvents, PropertyChanged,
};
pub use statekit_model::PropertyModel;
pub use statekit_persist::{
    ItemDescriptor, PersistError, PersistResult, PersistentObject, PropertyDescriptor,
    RegistryResolver, RelationshipDescriptor, Schema, SchemaBuilder, SchemaMap, TypeResolver,
    Validator, ValueConverter,
};
pub use statekit_registry::{Component, ComponentEvent, ComponentRegistry, RegistryError};
pub use statekit_store::{
    FileStorageContext, MemoryStorageContext, StorageContext, StoreError, StoreResult,
};
pub use statekit_types::{ObjectId, StoredDict, StoredValue};

/// Everything needed to define, persist, and observe a model.
pub mod prelude {
    pub use statekit_event::{Event, EventListener, Observable, ObservableEvents};
    pub use statekit_model::PropertyModel;
    pub use statekit_persist::{
        PersistentObject, PropertyDescriptor, Schema, SchemaMap, TypeResolver,
    };
    pub use statekit_registry::ComponentRegistry;
    pub use statekit_store::{MemoryStorageContext, StorageContext};
    pub use statekit_types::{ObjectId, StoredDict, StoredValue};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn task_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("task")
                .property(PropertyDescriptor::new("title").with_default(json!("")))
                .property(PropertyDescriptor::new("done").with_default(json!(false)))
                .relationship("subtasks")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn end_to_end_file_backed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let schema = task_schema();
        let resolver = SchemaMap::new().with(Arc::clone(&schema));
        let root_id;

        {
            let context: Arc<dyn StorageContext> =
                Arc::new(crate::FileStorageContext::open(&path).unwrap());
            let mut root = PersistentObject::new(Arc::clone(&schema));
            root.set_property("title", json!("ship release")).unwrap();
            root.insert_into_context(&context).unwrap();
            root_id = root.id();

            let mut sub = PersistentObject::new(Arc::clone(&schema));
            sub.set_property("title", json!("write changelog")).unwrap();
            root.append_item("subtasks", sub).unwrap();
            root.child_mut("subtasks", 0)
                .unwrap()
                .set_property("done", json!(true))
                .unwrap();
            root.close().unwrap();
        }

        let reopened: Arc<dyn StorageContext> =
            Arc::new(crate::FileStorageContext::open(&path).unwrap());
        let dict = reopened.get_storage_dict(root_id).unwrap().unwrap();
        let restored = PersistentObject::reconstruct(&dict, &resolver).unwrap();

        assert_eq!(restored.property("title").unwrap(), &json!("ship release"));
        let subtasks = restored.relationship("subtasks").unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].property("done").unwrap(), &json!(true));
    }

    #[test]
    fn registry_backed_reconstruction() {
        let registry = Arc::new(ComponentRegistry::new());
        registry.register(task_schema(), ["task"]).unwrap();
        let resolver = crate::RegistryResolver::new(registry);

        let mut task = PersistentObject::new(task_schema());
        task.set_property("title", json!("t")).unwrap();
        let dict = task.write_to_dict().unwrap();
        let restored = PersistentObject::reconstruct(&dict, &resolver).unwrap();
        assert_eq!(restored.property("title").unwrap(), &json!("t"));
    }

    #[test]
    fn property_model_bridges_object_changes() {
        let mut task = PersistentObject::new(task_schema());
        let title = Arc::new(PropertyModel::new(String::new()));
        let title2 = Arc::clone(&title);
        let _listener = task.observable().listen_property_changed(move |change| {
            if change.name == "title" {
                if let Some(s) = change.value.as_str() {
                    title2.set_value(s.to_string());
                }
            }
        });

        task.set_property("title", json!("hello")).unwrap();
        assert_eq!(title.value(), "hello");
    }
}
