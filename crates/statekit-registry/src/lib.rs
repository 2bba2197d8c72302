//! Component registry for StateKit.
//!
//! A [`ComponentRegistry`] maps declared capability tags (strings) to
//! registered components, and announces registrations and removals through
//! events. The persistence layer uses a registry to resolve polymorphic
//! child types during reconstruction when the caller does not supply an
//! explicit factory map.
//!
//! The registry is an explicit value: the application constructs one,
//! registers its components at startup, and passes it (usually as
//! `Arc<ComponentRegistry>`) to whatever needs lookups. There is no
//! process-wide singleton.

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{Component, ComponentEvent, ComponentRegistry};
