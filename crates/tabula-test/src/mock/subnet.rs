//! Sample record type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_core::{Entity, EntityId};

use super::MockRecord;

/// An IPv4 subnet, as listed on the address-space screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: EntityId,
    pub cidr: String,
    pub site: String,
    pub vlan: u16,
    pub status: String,
}

impl Entity for Subnet {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl MockRecord for Subnet {
    fn matches(&self, key: &str, value: &str) -> bool {
        match key {
            "site" => self.site == value,
            "status" => self.status == value,
            "vlan" => value.parse::<u16>().is_ok_and(|vlan| vlan == self.vlan),
            "q" => self.cidr.contains(value),
            _ => true,
        }
    }

    fn apply(&mut self, changes: &Value) {
        if let Some(status) = changes.get("status").and_then(Value::as_str) {
            self.status = status.to_owned();
        }
        if let Some(site) = changes.get("site").and_then(Value::as_str) {
            self.site = site.to_owned();
        }
        if let Some(vlan) = changes
            .get("vlan")
            .and_then(Value::as_u64)
            .and_then(|v| u16::try_from(v).ok())
        {
            self.vlan = vlan;
        }
    }
}

/// Builds `count` active subnets at site `ams`, with stable ids.
pub fn subnets(count: usize) -> Vec<Subnet> {
    (0..count)
        .map(|i| Subnet {
            id: EntityId::new(format!("sn-{i:04}")),
            cidr: format!("10.{}.{}.0/24", i / 256, i % 256),
            site: "ams".to_owned(),
            vlan: 100 + (i % 50) as u16,
            status: "active".to_owned(),
        })
        .collect()
}
