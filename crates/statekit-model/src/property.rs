//! A single observable value cell.

use std::sync::Mutex;

use statekit_event::{Event, EventListener};

/// Holds one value and notifies listeners when it changes.
///
/// Reads clone the current value; writes replace it and fire the
/// value-changed event with the new value when it differs from the old.
/// The cell is thread-safe; the internal lock is released before listeners
/// run, so a listener may read or write the model.
pub struct PropertyModel<T> {
    value: Mutex<T>,
    value_changed: Event<T>,
}

impl<T> PropertyModel<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Create a model holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            value_changed: Event::new(),
        }
    }

    /// The current value.
    pub fn value(&self) -> T {
        self.value.lock().expect("lock poisoned").clone()
    }

    /// Replace the value, notifying listeners if it changed.
    pub fn set_value(&self, value: T) {
        let changed = {
            let mut guard = self.value.lock().expect("lock poisoned");
            if *guard == value {
                false
            } else {
                *guard = value.clone();
                true
            }
        };
        if changed {
            self.value_changed.fire(&value);
        }
    }

    /// Modify the value in place, notifying listeners if it changed.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let after = {
            let mut guard = self.value.lock().expect("lock poisoned");
            let before = guard.clone();
            f(&mut guard);
            if *guard == before {
                None
            } else {
                Some(guard.clone())
            }
        };
        if let Some(value) = after {
            self.value_changed.fire(&value);
        }
    }

    /// Listen for value changes. The listener receives the new value.
    pub fn listen<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.value_changed.listen(handler)
    }
}

impl<T> Default for PropertyModel<T>
where
    T: Clone + PartialEq + Send + Default + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PropertyModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyModel")
            .field("value", &*self.value.lock().expect("lock poisoned"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
