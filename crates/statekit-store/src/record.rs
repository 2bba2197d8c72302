//! Flat per-object records: the internal normal form of the provided
//! context implementations.
//!
//! A nested stored dict flattens into one [`StoredRecord`] per object:
//! plain property values (bookkeeping and unknown keys included) stay on
//! the record, while child objects are replaced by their identities. A
//! stored value is recognized as a child dict by its parseable `uuid`
//! bookkeeping key; a list is recognized as a relationship when every
//! element is a child dict (an empty list re-nests to `[]` either way, so
//! the empty case is harmless).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use statekit_types::{is_object_dict, object_id_of, ObjectId, StoredDict, StoredValue};

use crate::error::{StoreError, StoreResult};

/// One object's flattened stored state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Plain property values, bookkeeping keys, and unknown keys.
    pub properties: StoredDict,
    /// To-one child slots. `None` marks a slot that was explicitly
    /// cleared; cleared slots are omitted when re-nesting.
    pub items: BTreeMap<String, Option<ObjectId>>,
    /// Ordered to-many children by identity.
    pub relationships: BTreeMap<String, Vec<ObjectId>>,
}

/// Whether a stored value should be flattened as a relationship list.
fn is_relationship_list(value: &StoredValue) -> bool {
    value
        .as_array()
        .is_some_and(|list| list.iter().all(is_object_dict))
}

/// Flatten a nested dict into records, appending them to `out`.
///
/// Returns the identity of the dict's own record. Fails if any object dict
/// in the subtree lacks an identity.
pub fn flatten(dict: StoredDict, out: &mut Vec<(ObjectId, StoredRecord)>) -> StoreResult<ObjectId> {
    let id = object_id_of(&dict).ok_or_else(|| StoreError::MissingIdentity {
        key: "<root>".to_string(),
    })?;
    let mut record = StoredRecord::default();
    for (key, value) in dict {
        if is_object_dict(&value) {
            let child = value
                .as_object()
                .cloned()
                .unwrap_or_default();
            let child_id = flatten(child, out)?;
            record.items.insert(key, Some(child_id));
        } else if is_relationship_list(&value) {
            let mut child_ids = Vec::new();
            for entry in value.as_array().cloned().unwrap_or_default() {
                let child = entry.as_object().cloned().ok_or_else(|| {
                    StoreError::MissingIdentity { key: key.clone() }
                })?;
                child_ids.push(flatten(child, out)?);
            }
            record.relationships.insert(key, child_ids);
        } else {
            record.properties.insert(key, value);
        }
    }
    out.push((id, record));
    Ok(id)
}

/// Re-nest a record into its full stored dict using `lookup` to resolve
/// child records.
pub fn nest<F>(record: &StoredRecord, lookup: &F) -> StoreResult<StoredDict>
where
    F: Fn(ObjectId) -> StoreResult<StoredRecord>,
{
    let mut dict = record.properties.clone();
    for (key, child) in &record.items {
        if let Some(child_id) = child {
            let child_record = lookup(*child_id)?;
            dict.insert(
                key.clone(),
                StoredValue::Object(nest(&child_record, lookup)?),
            );
        }
    }
    for (key, child_ids) in &record.relationships {
        let mut list = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            let child_record = lookup(*child_id)?;
            list.push(StoredValue::Object(nest(&child_record, lookup)?));
        }
        dict.insert(key.clone(), StoredValue::Array(list));
    }
    Ok(dict)
}

/// All object identities in a record's subtree (the record's own children,
/// recursively), in no particular order.
pub fn descendants<F>(record: &StoredRecord, lookup: &F) -> StoreResult<Vec<ObjectId>>
where
    F: Fn(ObjectId) -> StoreResult<StoredRecord>,
{
    let mut ids = Vec::new();
    let mut pending: Vec<ObjectId> = record
        .items
        .values()
        .filter_map(|c| *c)
        .chain(record.relationships.values().flatten().copied())
        .collect();
    while let Some(id) = pending.pop() {
        let child = lookup(id)?;
        pending.extend(child.items.values().filter_map(|c| *c));
        pending.extend(child.relationships.values().flatten().copied());
        ids.push(id);
    }
    Ok(ids)
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
    fn flatten_splits_children_from_properties() {
        let parent_id = ObjectId::new();
        let child_id = ObjectId::new();
        let child = object_dict("child", child_id, &[("name", json!("x"))]);
        let parent = object_dict(
            "parent",
            parent_id,
            &[
                ("name", json!("a")),
                ("children", StoredValue::Array(vec![child.into()])),
                ("bounds", json!({"x": 0, "y": 1})),
            ],
        );

        let mut out = Vec::new();
        let id = flatten(parent, &mut out).unwrap();
        assert_eq!(id, parent_id);
        assert_eq!(out.len(), 2);

        let (_, parent_record) = out.iter().find(|(i, _)| *i == parent_id).unwrap();
        assert_eq!(parent_record.properties.get("name"), Some(&json!("a")));
        // Plain dict-shaped property values stay properties.
        assert!(parent_record.properties.contains_key("bounds"));
        assert_eq!(
            parent_record.relationships.get("children"),
            Some(&vec![child_id])
        );
    }

    #[test]
    fn flatten_rejects_identityless_dicts() {
        let mut dict = StoredDict::new();
        dict.insert("name".into(), json!("a"));
        let mut out = Vec::new();
        assert!(matches!(
            flatten(dict, &mut out).unwrap_err(),
            StoreError::MissingIdentity { .. }
        ));
    }

    #[test]
    fn nest_restores_relationship_order() {
        let parent_id = ObjectId::new();
        let first = ObjectId::new();
        let second = ObjectId::new();
        let parent = object_dict(
            "parent",
            parent_id,
            &[(
                "children",
                StoredValue::Array(vec![
                    object_dict("child", first, &[("name", json!("1"))]).into(),
                    object_dict("child", second, &[("name", json!("2"))]).into(),
                ]),
            )],
        );

        let mut out = Vec::new();
        flatten(parent.clone(), &mut out).unwrap();
        let lookup = |id: ObjectId| {
            out.iter()
                .find(|(i, _)| *i == id)
                .map(|(_, r)| r.clone())
                .ok_or(StoreError::ObjectNotFound { id })
        };
        let (_, parent_record) = out.iter().find(|(i, _)| *i == parent_id).unwrap();
        assert_eq!(nest(parent_record, &lookup).unwrap(), parent);
    }

    #[test]
    fn descendants_walks_the_whole_subtree() {
        let parent_id = ObjectId::new();
        let child_id = ObjectId::new();
        let grandchild_id = ObjectId::new();
        let grandchild = object_dict("leaf", grandchild_id, &[]);
        let child = object_dict(
            "child",
            child_id,
            &[("leaves", StoredValue::Array(vec![grandchild.into()]))],
        );
        let parent = object_dict("parent", parent_id, &[("source", child.into())]);

        let mut out = Vec::new();
        flatten(parent, &mut out).unwrap();
        let lookup = |id: ObjectId| {
            out.iter()
                .find(|(i, _)| *i == id)
                .map(|(_, r)| r.clone())
                .ok_or(StoreError::ObjectNotFound { id })
        };
        let (_, parent_record) = out.iter().find(|(i, _)| *i == parent_id).unwrap();
        let mut ids = descendants(parent_record, &lookup).unwrap();
        ids.sort();
        let mut expected = vec![child_id, grandchild_id];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
