//! Observable value holders for StateKit.
//!
//! A [`PropertyModel`] wraps a single value and notifies listeners when it
//! changes, giving bindings a uniform surface: read the current value, write
//! a new one, listen for changes.
//!
//! # Key Types
//!
//! - [`PropertyModel`] — an observable single-value cell
//!
//! # Design Rules
//!
//! 1. Writes compare against the current value; equal writes do not notify.
//! 2. Notification carries the post-mutation value and fires after the
//!    value is committed, so a listener reading the model sees the new
//!    value.
//! 3. The lock guarding the value is never held while listeners run.

pub mod property;

pub use property::PropertyModel;
