//! The StateKit persistent object model.
//!
//! This crate maintains a consistent mapping between a live, mutable object
//! graph and an external stored representation, under insertion, deletion,
//! reordering, and deferred writes.
//!
//! # Key Types
//!
//! - [`Schema`] — declarative per-type metadata: property, item (to-one),
//!   and relationship (to-many) descriptors
//! - [`PersistentObject`] — the stateful entity: current values, owned
//!   child objects, dirty tracking, delayed-write scopes, close lifecycle
//! - [`TypeResolver`] — polymorphic subtype resolution during
//!   reconstruction ([`SchemaMap`] or [`RegistryResolver`])
//! - [`PersistError`] — the error taxonomy
//!
//! # Design Rules
//!
//! 1. All mutation goes through descriptor-mediated operations that
//!    validate, apply, mark dirty, and then notify — listeners always
//!    observe fully applied post-mutation state.
//! 2. A child's insertion state is governed entirely by its parent; a
//!    relationship child is stored exactly when its parent subtree is.
//! 3. Errors from validators, converters, and the storage context are
//!    never swallowed; a failed operation leaves in-memory state as it was
//!    immediately before the failing step.
//! 4. The core is single-threaded per object graph: no internal locking,
//!    no suspension. Distinct graphs may live on distinct threads.

pub mod delayed;
pub mod descriptor;
pub mod error;
pub mod object;
pub mod reconstruct;

pub use descriptor::{
    ItemDescriptor, PropertyDescriptor, RelationshipDescriptor, Schema, SchemaBuilder, Validator,
    ValueConverter,
};
pub use error::{PersistError, PersistResult};
pub use object::PersistentObject;
pub use reconstruct::{RegistryResolver, SchemaMap, TypeResolver};
