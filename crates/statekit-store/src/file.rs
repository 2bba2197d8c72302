//! JSON-file-backed storage context.
//!
//! [`FileStorageContext`] keeps the working state in a
//! [`MemoryStorageContext`] and writes the whole document back to disk
//! after every mutation (write-through). The on-disk form is one JSON
//! object:
//!
//! ```text
//! {
//!   "version": 1,
//!   "roots": [ <nested stored dict>, ... ]
//! }
//! ```
//!
//! Writes go to a sibling temp file followed by an atomic rename, so a
//! crash mid-write never leaves a torn document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use statekit_types::{ObjectId, StoredDict, StoredValue};

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStorageContext;
use crate::traits::StorageContext;

/// On-disk document version this implementation reads and writes.
const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Document {
    version: u32,
    roots: Vec<StoredDict>,
}

/// A write-through storage context persisted as a single JSON document.
pub struct FileStorageContext {
    memory: MemoryStorageContext,
    path: PathBuf,
}

impl FileStorageContext {
    /// Open a context at `path`, loading the existing document if present.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let memory = MemoryStorageContext::new();
        if path.exists() {
            let text = fs::read_to_string(&path)?;
            let document: Document = serde_json::from_str(&text)?;
            if document.version != DOCUMENT_VERSION {
                return Err(StoreError::Serialization(format!(
                    "unsupported document version {}",
                    document.version
                )));
            }
            for root in document.roots {
                memory.insert_root(root)?;
            }
            debug!(path = %path.display(), "storage document loaded");
        }
        Ok(Self { memory, path })
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns `true` if the context holds no objects.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Write the current state to disk.
    pub fn save(&self) -> StoreResult<()> {
        let mut roots = Vec::new();
        for root in self.memory.roots() {
            if let Some(dict) = self.memory.get_storage_dict(root)? {
                roots.push(dict);
            }
        }
        let document = Document {
            version: DOCUMENT_VERSION,
            roots,
        };
        let text = serde_json::to_string_pretty(&document)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageContext for FileStorageContext {
    fn insert_root(&self, dict: StoredDict) -> StoreResult<()> {
        self.memory.insert_root(dict)?;
        self.save()
    }

    fn remove_root(&self, object_id: ObjectId) -> StoreResult<()> {
        self.memory.remove_root(object_id)?;
        self.save()
    }

    fn set_property(&self, object_id: ObjectId, key: &str, value: StoredValue) -> StoreResult<()> {
        self.memory.set_property(object_id, key, value)?;
        self.save()
    }

    fn clear_property(&self, object_id: ObjectId, key: &str) -> StoreResult<()> {
        self.memory.clear_property(object_id, key)?;
        self.save()
    }

    fn update_properties(&self, object_id: ObjectId, deltas: StoredDict) -> StoreResult<()> {
        self.memory.update_properties(object_id, deltas)?;
        self.save()
    }

    fn set_item(
        &self,
        object_id: ObjectId,
        key: &str,
        child: Option<StoredDict>,
    ) -> StoreResult<()> {
        self.memory.set_item(object_id, key, child)?;
        self.save()
    }

    fn insert_item(
        &self,
        object_id: ObjectId,
        key: &str,
        index: usize,
        child: StoredDict,
    ) -> StoreResult<()> {
        self.memory.insert_item(object_id, key, index, child)?;
        self.save()
    }

    fn remove_item(&self, object_id: ObjectId, key: &str, index: usize) -> StoreResult<()> {
        self.memory.remove_item(object_id, key, index)?;
        self.save()
    }

    fn get_storage_dict(&self, object_id: ObjectId) -> StoreResult<Option<StoredDict>> {
        self.memory.get_storage_dict(object_id)
    }
}

impl std::fmt::Debug for FileStorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorageContext")
            .field("path", &self.path)
            .field("object_count", &self.memory.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statekit_types::{KEY_TYPE, KEY_UUID};

    fn object_dict(tag: &str, id: ObjectId, extra: &[(&str, StoredValue)]) -> StoredDict {
        let mut d = StoredDict::new();
        d.insert(KEY_TYPE.into(), json!(tag));
        d.insert(KEY_UUID.into(), json!(id.to_string()));
        for (k, v) in extra {
            d.insert((*k).into(), v.clone());
        }
        d
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.statekit.json");
        let id = ObjectId::new();

        {
            let ctx = FileStorageContext::open(&path).unwrap();
            ctx.insert_root(object_dict("root", id, &[("name", json!("a"))]))
                .unwrap();
            ctx.set_property(id, "name", json!("b")).unwrap();
        }

        let reopened = FileStorageContext::open(&path).unwrap();
        let dict = reopened.get_storage_dict(id).unwrap().unwrap();
        assert_eq!(dict.get("name"), Some(&json!("b")));
    }

    #[test]
    fn open_without_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let ctx = FileStorageContext::open(&path).unwrap();
        assert!(ctx.is_empty());
        // Nothing written until the first mutation.
        assert!(!path.exists());
    }

    #[test]
    fn structural_ops_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let root = ObjectId::new();
        let child = ObjectId::new();

        {
            let ctx = FileStorageContext::open(&path).unwrap();
            ctx.insert_root(object_dict(
                "root",
                root,
                &[("children", StoredValue::Array(vec![]))],
            ))
            .unwrap();
            ctx.insert_item(root, "children", 0, object_dict("child", child, &[]))
                .unwrap();
        }

        let reopened = FileStorageContext::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        let dict = reopened.get_storage_dict(root).unwrap().unwrap();
        let children = dict.get("children").unwrap().as_array().unwrap();
        assert_eq!(
            statekit_types::child_ids_of(children),
            vec![child]
        );
    }

    #[test]
    fn rejects_unknown_document_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"version": 99, "roots": []}"#).unwrap();
        assert!(matches!(
            FileStorageContext::open(&path).unwrap_err(),
            StoreError::Serialization(_)
        ));
    }
}
