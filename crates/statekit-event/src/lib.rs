//! Synchronous change-notification primitives for StateKit.
//!
//! This crate provides the typed multicast notifier that the rest of the
//! system builds on, plus the observable contract: the five canonical change
//! notifications a model object exposes.
//!
//! # Key Types
//!
//! - [`Event`] — a typed notification point; listeners fire synchronously in
//!   registration order
//! - [`EventListener`] — a scoped registration handle; dropping it
//!   deregisters the listener
//! - [`ObservableEvents`] — the bundle of canonical change events
//!   ([`PropertyChanged`], [`ItemSet`], [`ItemCleared`], [`ItemInserted`],
//!   [`ItemRemoved`])
//! - [`Observable`] — capability trait for objects exposing the bundle
//!
//! # Design Rules
//!
//! 1. Dispatch is synchronous and reentrancy-safe: no lock is held while a
//!    handler runs, so handlers may register or deregister listeners (even
//!    themselves) on the event being fired.
//! 2. Dispatch order is registration order, over a snapshot taken when the
//!    fire starts. Listeners added during a fire are not called by that
//!    fire; listeners removed during a fire are skipped if not yet reached.
//! 3. Failure semantics are fail-fast: handlers are infallible functions,
//!    and a panicking handler unwinds through `fire` immediately.
//! 4. Listener lifetime is explicit: handles are RAII resources owned by
//!    the registrant. Dropping a handle after its event has been dropped is
//!    a silent no-op.

pub mod event;
pub mod observable;

pub use event::{Event, EventListener};
pub use observable::{
    ItemCleared, ItemInserted, ItemRemoved, ItemSet, Observable, ObservableEvents, PropertyChanged,
};
