//! Record identity.

use derive_more::{AsRef, Deref, Display, From};
use serde::{Deserialize, Serialize};

/// Unique, stable identifier of a listed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(AsRef, Deref, Display, From)]
#[serde(transparent)]
#[as_ref(forward)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new [`EntityId`].
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Any record that can be listed, selected and mutated by id.
///
/// No further shape is assumed.
pub trait Entity {
    /// Returns the record's identifier.
    fn id(&self) -> &EntityId;
}
