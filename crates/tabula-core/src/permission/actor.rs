//! The acting user and the permissions resolved onto it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{PermissionKey, Role};

/// The capability keys granted to a user.
///
/// Resolved once when the user is loaded and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<PermissionKey>);

impl PermissionSet {
    /// Returns the permission set granted by a role.
    #[inline]
    pub fn for_role(role: Role) -> Self {
        role.permissions()
    }

    /// Returns true if the key is granted.
    #[inline]
    pub fn contains(&self, key: PermissionKey) -> bool {
        self.0.contains(&key)
    }

    /// Returns the number of granted keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is granted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the granted keys in order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionKey> {
        self.0.iter()
    }
}

impl FromIterator<PermissionKey> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The user on whose behalf a listing is driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: String,
    username: String,
    role: Option<Role>,
    permissions: Option<PermissionSet>,
    #[serde(default)]
    guest: bool,
}

impl Actor {
    /// Id of the guest placeholder.
    pub const GUEST_ID: &'static str = "guest";
    /// Username of the guest placeholder.
    pub const GUEST_USERNAME: &'static str = "guest";

    /// Creates a user holding `role`, with the role's permissions resolved.
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role: Some(role),
            permissions: Some(PermissionSet::for_role(role)),
            guest: false,
        }
    }

    /// Creates a user with an explicit permission set and no role.
    pub fn with_permissions(
        id: impl Into<String>,
        username: impl Into<String>,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role: None,
            permissions: Some(permissions),
            guest: false,
        }
    }

    /// Creates a user whose permissions were never resolved.
    pub fn unresolved(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role: None,
            permissions: None,
            guest: false,
        }
    }

    /// Returns the fallback placeholder used while nobody is signed in.
    ///
    /// The placeholder is denied every capability.
    pub fn guest() -> Self {
        Self {
            id: Self::GUEST_ID.to_owned(),
            username: Self::GUEST_USERNAME.to_owned(),
            role: None,
            permissions: None,
            guest: true,
        }
    }

    /// Returns the user id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the username.
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the role, if the permissions came from one.
    #[inline]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Returns the resolved permission set, if any.
    #[inline]
    pub fn permissions(&self) -> Option<&PermissionSet> {
        self.permissions.as_ref()
    }

    /// Returns true for the guest placeholder.
    #[inline]
    pub fn is_guest(&self) -> bool {
        self.guest
    }
}
