//! Error types for registry operations.

use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The component is already registered.
    #[error("component already registered (tags: {tags:?})")]
    AlreadyRegistered { tags: Vec<String> },

    /// The component was never registered (or already unregistered).
    #[error("component not registered")]
    NotRegistered,
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
