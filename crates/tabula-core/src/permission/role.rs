//! Static role to permission mapping.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use super::{Capability, PermissionKey, PermissionSet, Resource};

/// Roles an admin user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Unrestricted access, including audit log retention.
    SuperAdmin,
    /// Manages every listing and user accounts.
    Admin,
    /// Manages address space: subnets, VLANs and IP addresses.
    Operator,
    /// Reads everything, including the audit log.
    Auditor,
    /// Reads address space and dictionaries.
    Viewer,
}

impl Role {
    /// Checks if this role grants the given permission.
    pub const fn is_permitted(self, key: PermissionKey) -> bool {
        use Capability::{Create, Delete, Edit, View};
        use Resource::{AuditLog, Dictionary, DictionaryItem, IpAddress, Subnet, User, Vlan};

        match self {
            Self::SuperAdmin => true,

            Self::Admin => match key.resource {
                AuditLog => matches!(key.capability, View),
                User => matches!(key.capability, View | Create | Edit),
                Dictionary | DictionaryItem | Subnet | Vlan | IpAddress => true,
            },

            Self::Operator => match key.resource {
                Subnet | Vlan | IpAddress => matches!(key.capability, View | Create | Edit | Delete),
                Dictionary | DictionaryItem => matches!(key.capability, View),
                AuditLog | User => false,
            },

            Self::Auditor => matches!(key.capability, View),

            Self::Viewer => match key.resource {
                Subnet | Vlan | IpAddress | Dictionary | DictionaryItem => {
                    matches!(key.capability, View)
                }
                AuditLog | User => false,
            },
        }
    }

    /// Resolves every permission this role grants.
    pub fn permissions(self) -> PermissionSet {
        Resource::iter()
            .flat_map(|resource| Capability::iter().map(move |cap| resource.key(cap)))
            .filter(|key| self.is_permitted(*key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_has_everything() {
        let set = Role::SuperAdmin.permissions();
        assert_eq!(set.len(), Resource::iter().count() * Capability::iter().count());
    }

    #[test]
    fn test_auditor_is_read_only() {
        let set = Role::Auditor.permissions();
        assert!(set.iter().all(|key| key.capability.is_read_only()));
        assert!(set.contains(Resource::AuditLog.key(Capability::View)));
    }

    #[test]
    fn test_operator_cannot_touch_users() {
        assert!(!Role::Operator.is_permitted(Resource::User.key(Capability::View)));
        assert!(Role::Operator.is_permitted(Resource::Subnet.key(Capability::Delete)));
        assert!(!Role::Operator.is_permitted(Resource::Dictionary.key(Capability::Delete)));
    }

    #[test]
    fn test_only_super_admin_deletes_audit_log() {
        let key = Resource::AuditLog.key(Capability::Delete);
        let allowed: Vec<_> = Role::iter().filter(|role| role.is_permitted(key)).collect();
        assert_eq!(allowed, vec![Role::SuperAdmin]);
    }
}
