//! The abstract stored representation: nested dicts and lists with string
//! keys, shaped like JSON.
//!
//! A persistent object serializes to a [`StoredDict`] whose keys are the
//! declared storage keys of its descriptors plus three bookkeeping keys:
//! [`KEY_TYPE`] (the stable type tag used for polymorphic reconstruction),
//! [`KEY_UUID`] (the object's [`ObjectId`]), and [`KEY_MODIFIED`] (the UTC
//! timestamp of the last write). Child objects appear inline: an item is a
//! nested dict, a relationship is a list of nested dicts in position order.

use crate::object::ObjectId;

/// A single stored value (property value, nested dict, or list).
pub type StoredValue = serde_json::Value;

/// A stored record: string keys to stored values.
pub type StoredDict = serde_json::Map<String, StoredValue>;

/// Bookkeeping key carrying the stable type tag.
pub const KEY_TYPE: &str = "type";

/// Bookkeeping key carrying the object identity.
pub const KEY_UUID: &str = "uuid";

/// Bookkeeping key carrying the last-modified UTC timestamp.
pub const KEY_MODIFIED: &str = "modified";

/// Extract the object identity from a stored dict, if present and valid.
pub fn object_id_of(dict: &StoredDict) -> Option<ObjectId> {
    dict.get(KEY_UUID)
        .and_then(|v| v.as_str())
        .and_then(|s| ObjectId::parse(s).ok())
}

/// Extract the stable type tag from a stored dict.
pub fn type_tag_of(dict: &StoredDict) -> Option<&str> {
    dict.get(KEY_TYPE).and_then(|v| v.as_str())
}

/// Whether a stored value is an object dict (a dict carrying a parseable
/// `uuid` bookkeeping key) as opposed to a plain dict-shaped property value.
pub fn is_object_dict(value: &StoredValue) -> bool {
    value.as_object().is_some_and(|d| object_id_of(d).is_some())
}

/// Identities of the object dicts in a stored list, in position order.
///
/// Entries that are not object dicts are skipped.
pub fn child_ids_of(list: &[StoredValue]) -> Vec<ObjectId> {
    list.iter()
        .filter_map(|v| v.as_object())
        .filter_map(object_id_of)
        .collect()
}
