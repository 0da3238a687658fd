//! Capability keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// Listable admin resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, AsRefStr, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    /// Dictionary types.
    Dictionary,
    /// Entries of a dictionary type.
    DictionaryItem,
    /// Audit log entries.
    AuditLog,
    /// IP subnets.
    Subnet,
    /// VLANs.
    Vlan,
    /// Individual IP addresses.
    IpAddress,
    /// User accounts.
    User,
}

impl Resource {
    /// Returns the permission key for the given capability on this resource.
    #[inline]
    pub const fn key(self, capability: Capability) -> PermissionKey {
        PermissionKey::new(self, capability)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// The four standard capabilities every listing is gated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, AsRefStr, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Can list and read records.
    View,
    /// Can create new records.
    Create,
    /// Can update existing records.
    Edit,
    /// Can delete records.
    Delete,
}

impl Capability {
    /// Returns true if this capability does not modify anything.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::View)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// A capability on a resource, written as `"<resource>:<capability>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey {
    /// The resource the capability applies to.
    pub resource: Resource,
    /// The capability granted.
    pub capability: Capability,
}

impl PermissionKey {
    /// Creates a new [`PermissionKey`].
    #[inline]
    pub const fn new(resource: Resource, capability: Capability) -> Self {
        Self {
            resource,
            capability,
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.capability)
    }
}

impl FromStr for PermissionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::validation().with_message(format!("unknown permission key '{s}'"));

        let (resource, capability) = s.split_once(':').ok_or_else(unknown)?;
        let resource = Resource::from_str(resource).map_err(|_| unknown())?;
        let capability = Capability::from_str(capability).map_err(|_| unknown())?;

        Ok(Self::new(resource, capability))
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.to_string()
    }
}
