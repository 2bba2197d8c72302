//! Error types for foundation-type conversions.

use thiserror::Error;

/// Errors that can occur constructing or parsing foundation types.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A string could not be parsed as an object identity.
    #[error("invalid object id: {text}: {reason}")]
    InvalidObjectId { text: String, reason: String },
}

/// Convenience type alias for foundation-type operations.
pub type Result<T> = std::result::Result<T, TypeError>;
