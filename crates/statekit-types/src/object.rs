//! Storage identity for persistent objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TypeError};

/// Storage identity of a persistent object.
///
/// Assigned when an object is created and carried through its stored
/// representation under the `uuid` bookkeeping key. Identities are UUID v4;
/// they are stable across read/write round trips and unique within a
/// storage context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse the canonical hyphenated form.
    pub fn parse(text: &str) -> Result<Self> {
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|e| TypeError::InvalidObjectId {
                text: text.to_string(),
                reason: e.to_string(),
            })
    }

    /// Short form for diagnostics (first 8 hex chars).
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
