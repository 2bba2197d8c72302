//! The component registry: capability lookup by declared type tag.

use std::any::Any;
use std::sync::{Arc, Mutex};

use tracing::debug;

use statekit_event::{Event, EventListener};

use crate::error::{RegistryError, RegistryResult};

/// A registered component: any shareable value.
///
/// Components are held and compared by `Arc` pointer identity, so the same
/// allocation cannot be registered twice while distinct allocations of
/// equal values can.
pub type Component = Arc<dyn Any + Send + Sync>;

/// Payload for the registered/unregistered events.
#[derive(Clone)]
pub struct ComponentEvent {
    /// The component in question.
    pub component: Component,
    /// The capability tags it was registered under.
    pub tags: Vec<String>,
}

impl std::fmt::Debug for ComponentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEvent")
            .field("tags", &self.tags)
            .finish()
    }
}

struct Registration {
    component: Component,
    tags: Vec<String>,
}

/// Process-explicit lookup of components by declared capability tag.
///
/// Lookups return components in registration order. All operations are
/// synchronous; the registered/unregistered events fire on the calling
/// thread after the table has been updated.
#[derive(Default)]
pub struct ComponentRegistry {
    registrations: Mutex<Vec<Registration>>,
    component_registered: Event<ComponentEvent>,
    component_unregistered: Event<ComponentEvent>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under a set of capability tags.
    ///
    /// Fails if the same component (by pointer identity) is already
    /// registered.
    pub fn register<I, S>(&self, component: Component, tags: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        {
            let mut registrations = self.registrations.lock().expect("lock poisoned");
            if let Some(existing) = registrations
                .iter()
                .find(|r| Arc::ptr_eq(&r.component, &component))
            {
                return Err(RegistryError::AlreadyRegistered {
                    tags: existing.tags.clone(),
                });
            }
            registrations.push(Registration {
                component: Arc::clone(&component),
                tags: tags.clone(),
            });
        }
        debug!(?tags, "component registered");
        self.component_registered
            .fire(&ComponentEvent { component, tags });
        Ok(())
    }

    /// Unregister a previously registered component.
    pub fn unregister(&self, component: &Component) -> RegistryResult<()> {
        let removed = {
            let mut registrations = self.registrations.lock().expect("lock poisoned");
            let position = registrations
                .iter()
                .position(|r| Arc::ptr_eq(&r.component, component))
                .ok_or(RegistryError::NotRegistered)?;
            registrations.remove(position)
        };
        debug!(tags = ?removed.tags, "component unregistered");
        self.component_unregistered.fire(&ComponentEvent {
            component: removed.component,
            tags: removed.tags,
        });
        Ok(())
    }

    /// All components registered under `tag`, in registration order.
    pub fn components_by_tag(&self, tag: &str) -> Vec<Component> {
        let registrations = self.registrations.lock().expect("lock poisoned");
        registrations
            .iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .map(|r| Arc::clone(&r.component))
            .collect()
    }

    /// Components registered under `tag` that downcast to `T`, in
    /// registration order.
    pub fn get_components_by_type<T: Any + Send + Sync>(&self, tag: &str) -> Vec<Arc<T>> {
        self.components_by_tag(tag)
            .into_iter()
            .filter_map(|c| c.downcast::<T>().ok())
            .collect()
    }

    /// The first component registered under `tag` that downcasts to `T`.
    pub fn get_component_by_type<T: Any + Send + Sync>(&self, tag: &str) -> Option<Arc<T>> {
        self.get_components_by_type::<T>(tag).into_iter().next()
    }

    /// Listen for registrations.
    pub fn listen_component_registered<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&ComponentEvent) + Send + Sync + 'static,
    {
        self.component_registered.listen(handler)
    }

    /// Listen for removals.
    pub fn listen_component_unregistered<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&ComponentEvent) + Send + Sync + 'static,
    {
        self.component_unregistered.listen(handler)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.registrations.lock().expect("lock poisoned").len();
        f.debug_struct("ComponentRegistry")
            .field("registration_count", &count)
            .finish()
    }
}
