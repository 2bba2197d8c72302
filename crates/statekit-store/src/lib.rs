//! Storage-context boundary for StateKit.
//!
//! A storage context durably stores and retrieves a tree of dict-like
//! records keyed by object id, property name, and relationship position.
//! The persistence core forwards incremental writes to a context; any
//! concrete encoding (document store, JSON file, in-memory table) is a
//! context implementation detail.
//!
//! # Storage Backends
//!
//! All backends implement the [`StorageContext`] trait:
//!
//! - [`MemoryStorageContext`] — flat record table for tests and embedding
//! - [`FileStorageContext`] — write-through JSON document on disk
//!
//! # Design Rules
//!
//! 1. Every stored object is individually addressable by its [`ObjectId`],
//!    so single-key deltas after a subtree insert need no path information.
//! 2. Child dicts arrive nested (as produced by the persistence layer) and
//!    are flattened on ingest; `get_storage_dict` reconstitutes the nested
//!    form, preserving relationship order as position.
//! 3. Contexts never interpret property values; unknown keys pass through
//!    verbatim.
//! 4. All errors are propagated, never silently ignored; a failed
//!    structural operation leaves the stored state unchanged.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use file::FileStorageContext;
pub use memory::MemoryStorageContext;
pub use record::StoredRecord;
pub use traits::StorageContext;
