//! Typed synchronous multicast events with scoped listener handles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Handler slot: registration id plus the boxed handler.
///
/// Handlers uniformly return `bool` ("handled"); [`Event::listen`] wraps
/// void handlers to return `false` so that a single listener table serves
/// `fire`, `fire_any`, and `fire_all`.
struct Slot<T> {
    id: u64,
    handler: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

struct EventCore<T> {
    slots: Mutex<Vec<Slot<T>>>,
    next_id: AtomicU64,
}

impl<T> EventCore<T> {
    fn remove(&self, id: u64) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        slots.retain(|slot| slot.id != id);
    }

    fn contains(&self, id: u64) -> bool {
        let slots = self.slots.lock().expect("lock poisoned");
        slots.iter().any(|slot| slot.id == id)
    }

    /// Snapshot of the current slots in registration order.
    fn snapshot(&self) -> Vec<(u64, Arc<dyn Fn(&T) -> bool + Send + Sync>)> {
        let slots = self.slots.lock().expect("lock poisoned");
        slots
            .iter()
            .map(|slot| (slot.id, Arc::clone(&slot.handler)))
            .collect()
    }
}

/// A typed notification point to which listeners can be attached.
///
/// Cloning an `Event` yields another handle to the same listener table, so
/// an owner can hold the event while handing fire-capable clones elsewhere.
pub struct Event<T> {
    core: Arc<EventCore<T>>,
}

impl<T> Event<T> {
    /// Create a new event with no listeners.
    pub fn new() -> Self {
        Self {
            core: Arc::new(EventCore {
                slots: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.core.slots.lock().expect("lock poisoned").len()
    }

    /// Register a listener; returns the scoped handle that owns the
    /// registration.
    ///
    /// Registration order is preserved. Registering the same closure twice
    /// produces two independent slots.
    pub fn listen<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&T) + Send + Sync + 'static,
        T: 'static,
    {
        self.listen_until(move |args| {
            handler(args);
            false
        })
    }

    /// Register a listener whose return value participates in
    /// [`fire_any`](Self::fire_any) / [`fire_all`](Self::fire_all)
    /// short-circuiting.
    pub fn listen_until<F>(&self, handler: F) -> EventListener
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
        T: 'static,
    {
        let id = self.core.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut slots = self.core.slots.lock().expect("lock poisoned");
            slots.push(Slot {
                id,
                handler: Arc::new(handler),
            });
        }
        let weak: Weak<EventCore<T>> = Arc::downgrade(&self.core);
        EventListener {
            remove: Some(Box::new(move || {
                // Event already dropped: deregistration is a no-op.
                if let Some(core) = weak.upgrade() {
                    core.remove(id);
                }
            })),
        }
    }

    /// Call listeners (in registration order) unconditionally.
    pub fn fire(&self, args: &T) {
        for (id, handler) in self.core.snapshot() {
            // Skip listeners deregistered by an earlier handler in this
            // same dispatch.
            if self.core.contains(id) {
                handler(args);
            }
        }
    }

    /// Call listeners (in registration order) until one returns `true`.
    ///
    /// Returns `true` if some listener handled the notification, `false`
    /// otherwise.
    pub fn fire_any(&self, args: &T) -> bool {
        for (id, handler) in self.core.snapshot() {
            if self.core.contains(id) && handler(args) {
                return true;
            }
        }
        false
    }

    /// Call listeners (in registration order) until one returns `false`.
    ///
    /// Returns `false` if some listener declined, `true` otherwise. Only
    /// listeners registered through [`listen_until`](Self::listen_until)
    /// can return `true`, so this is meaningful for events whose listeners
    /// all participate in the protocol.
    pub fn fire_all(&self, args: &T) -> bool {
        for (id, handler) in self.core.snapshot() {
            if self.core.contains(id) && !handler(args) {
                return false;
            }
        }
        true
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T> std::fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Scoped listener registration.
///
/// The handle owns the registration: dropping it (or calling
/// [`close`](Self::close)) deregisters the listener. The handle holds only
/// a weak reference to the event, so it may safely outlive it.
pub struct EventListener {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl EventListener {
    /// Deregister now instead of at drop. Idempotent.
    pub fn close(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Registration and ordering
    // -----------------------------------------------------------------------

    #[test]
    fn listeners_fire_in_registration_order() {
        let event: Event<u32> = Event::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let _l1 = event.listen(move |v| o1.lock().unwrap().push(("first", *v)));
        let o2 = Arc::clone(&order);
        let _l2 = event.listen(move |v| o2.lock().unwrap().push(("second", *v)));

        event.fire(&7);
        assert_eq!(*order.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn duplicate_registration_gets_two_slots() {
        let event: Event<()> = Event::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handler = {
            let count = Arc::clone(&count);
            move |_: &()| {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        let _l1 = event.listen(handler.clone());
        let _l2 = event.listen(handler);
        assert_eq!(event.listener_count(), 2);
        event.fire(&());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    // -----------------------------------------------------------------------
    // Handle lifetime
    // -----------------------------------------------------------------------

    #[test]
    fn dropping_handle_deregisters() {
        let event: Event<()> = Event::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener = event.listen(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        event.fire(&());
        drop(listener);
        event.fire(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(event.listener_count(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let event: Event<()> = Event::new();
        let mut listener = event.listen(|_| {});
        listener.close();
        listener.close();
        assert_eq!(event.listener_count(), 0);
    }

    #[test]
    fn dropping_handle_after_event_is_a_no_op() {
        let event: Event<()> = Event::new();
        let listener = event.listen(|_| {});
        drop(event);
        drop(listener); // must not panic
    }

    // -----------------------------------------------------------------------
    // Dispatch snapshot semantics
    // -----------------------------------------------------------------------

    #[test]
    fn self_deregistration_does_not_disturb_other_listeners() {
        let event: Event<()> = Event::new();
        let count = Arc::new(AtomicUsize::new(0));

        // First listener deregisters itself mid-fire.
        let slot: Arc<Mutex<Option<EventListener>>> = Arc::new(Mutex::new(None));
        let slot_inner = Arc::clone(&slot);
        let c1 = Arc::clone(&count);
        let self_removing = event.listen(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
            if let Some(mut me) = slot_inner.lock().unwrap().take() {
                me.close();
            }
        });
        *slot.lock().unwrap() = Some(self_removing);

        let c2 = Arc::clone(&count);
        let _after = event.listen(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        event.fire(&());
        // Both ran exactly once.
        assert_eq!(count.load(Ordering::SeqCst), 2);
        // The self-removing listener is gone for the next fire.
        event.fire(&());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_removed_mid_fire_is_skipped_if_not_yet_reached() {
        let event: Event<()> = Event::new();
        let count = Arc::new(AtomicUsize::new(0));

        let victim_slot: Arc<Mutex<Option<EventListener>>> = Arc::new(Mutex::new(None));
        let vs = Arc::clone(&victim_slot);
        let _first = event.listen(move |_| {
            // Remove the listener registered after us.
            vs.lock().unwrap().take();
        });
        let c = Arc::clone(&count);
        let victim = event.listen(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        *victim_slot.lock().unwrap() = Some(victim);

        event.fire(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_added_mid_fire_is_not_called_that_fire() {
        let event: Event<()> = Event::new();
        let count = Arc::new(AtomicUsize::new(0));
        let added: Arc<Mutex<Vec<EventListener>>> = Arc::new(Mutex::new(Vec::new()));

        let event_inner = event.clone();
        let added_inner = Arc::clone(&added);
        let count_inner = Arc::clone(&count);
        let _l = event.listen(move |_| {
            // Only the first fire registers; later fires must not drop the
            // handle, or the new listener would be deregistered before the
            // dispatch snapshot reaches it.
            let mut handles = added_inner.lock().unwrap();
            if handles.is_empty() {
                let c = Arc::clone(&count_inner);
                handles.push(event_inner.listen(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });

        event.fire(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        event.fire(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    // -----------------------------------------------------------------------
    // fire_any / fire_all
    // -----------------------------------------------------------------------

    #[test]
    fn fire_any_stops_at_first_handled() {
        let event: Event<u32> = Event::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&calls);
        let _l1 = event.listen_until(move |v| {
            c1.fetch_add(1, Ordering::SeqCst);
            *v > 10
        });
        let c2 = Arc::clone(&calls);
        let _l2 = event.listen_until(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
            true
        });

        assert!(event.fire_any(&20));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(event.fire_any(&5));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn fire_any_with_no_listeners_returns_false() {
        let event: Event<()> = Event::new();
        assert!(!event.fire_any(&()));
    }

    #[test]
    fn fire_all_stops_at_first_decline() {
        let event: Event<u32> = Event::new();
        let _accept = event.listen_until(|_| true);
        assert!(event.fire_all(&1));
        let _decline = event.listen_until(|v| *v != 3);
        assert!(event.fire_all(&1));
        assert!(!event.fire_all(&3));
    }

    // -----------------------------------------------------------------------
    // Cross-thread use (distinct graphs on distinct threads)
    // -----------------------------------------------------------------------

    #[test]
    fn events_are_usable_across_threads() {
        let event: Event<u32> = Event::new();
        let total = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&total);
        let _l = event.listen(move |v| {
            t.fetch_add(*v as usize, Ordering::SeqCst);
        });

        let fired = event.clone();
        let handle = std::thread::spawn(move || fired.fire(&21));
        handle.join().expect("thread should not panic");
        event.fire(&21);
        assert_eq!(total.load(Ordering::SeqCst), 42);
    }
}
