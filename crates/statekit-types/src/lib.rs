//! Foundation types for StateKit.
//!
//! This crate provides the identity and stored-representation types used
//! throughout the StateKit system. Every other StateKit crate depends on
//! `statekit-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] — storage identity of a persistent object (UUID v4)
//! - [`StoredValue`] / [`StoredDict`] — the abstract nested-dict stored
//!   representation (string keys, JSON-shaped values)
//!
//! The physical encoding of a stored dict (document store, JSON file,
//! in-memory table) is a storage-context concern; these types only fix the
//! logical shape.

pub mod error;
pub mod object;
pub mod stored;

pub use error::TypeError;
pub use object::ObjectId;
pub use stored::{
    child_ids_of, is_object_dict, object_id_of, type_tag_of, StoredDict, StoredValue, KEY_MODIFIED,
    KEY_TYPE, KEY_UUID,
};
