//! Fail-closed permission checks and the per-screen capability projection.

use serde::{Deserialize, Serialize};

use super::{Actor, Capability, PermissionKey, Resource};
use crate::{Error, Result, TRACING_TARGET_AUTHORIZATION};

/// Pure predicate over a user's permission set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGate;

impl PermissionGate {
    /// Checks whether `user` holds `key`.
    ///
    /// Returns false when there is no user, the user has no permission set,
    /// or the user is the guest placeholder.
    pub fn check(user: Option<&Actor>, key: PermissionKey) -> bool {
        let Some(user) = user else {
            tracing::trace!(
                target: TRACING_TARGET_AUTHORIZATION,
                permission = %key,
                "denied: no user"
            );
            return false;
        };

        if user.is_guest() {
            tracing::trace!(
                target: TRACING_TARGET_AUTHORIZATION,
                permission = %key,
                "denied: guest placeholder"
            );
            return false;
        }

        let granted = user
            .permissions()
            .is_some_and(|permissions| permissions.contains(key));

        tracing::trace!(
            target: TRACING_TARGET_AUTHORIZATION,
            user_id = user.id(),
            permission = %key,
            granted,
            "permission checked"
        );

        granted
    }

    /// Checks a key given in its string form. Unknown keys are denied.
    pub fn check_str(user: Option<&Actor>, key: &str) -> bool {
        match key.parse::<PermissionKey>() {
            Ok(key) => Self::check(user, key),
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_AUTHORIZATION,
                    permission = key,
                    "denied: unknown permission key"
                );
                false
            }
        }
    }
}

/// The four standard capability flags of one screen.
///
/// Derived once per screen with [`Capabilities::project`]; call sites read
/// these flags instead of checking permissions themselves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Can list and read records.
    pub can_view: bool,
    /// Can create records.
    pub can_create: bool,
    /// Can update records.
    pub can_edit: bool,
    /// Can delete records.
    pub can_delete: bool,
}

impl Capabilities {
    /// Projects the permission gate onto the four capabilities of `resource`.
    pub fn project(user: Option<&Actor>, resource: Resource) -> Self {
        let check = |capability| PermissionGate::check(user, resource.key(capability));

        Self {
            can_view: check(Capability::View),
            can_create: check(Capability::Create),
            can_edit: check(Capability::Edit),
            can_delete: check(Capability::Delete),
        }
    }

    /// Returns the projection with every capability denied.
    #[inline]
    pub const fn none() -> Self {
        Self {
            can_view: false,
            can_create: false,
            can_edit: false,
            can_delete: false,
        }
    }

    /// Returns the flag for `capability`.
    #[inline]
    pub const fn allows(self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.can_view,
            Capability::Create => self.can_create,
            Capability::Edit => self.can_edit,
            Capability::Delete => self.can_delete,
        }
    }

    /// Converts the flag for `capability` into a `Result`, returning an
    /// authorization error if it is not granted.
    pub fn require(self, resource: Resource, capability: Capability) -> Result<()> {
        if self.allows(capability) {
            return Ok(());
        }

        Err(Error::authorization_denied().with_message(format!(
            "You do not have permission to {capability} {}.",
            resource.as_ref().replace('_', " ")
        )))
    }
}
