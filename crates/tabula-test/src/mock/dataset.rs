//! Shared in-memory record set.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tabula_core::{Entity, EntityId};

/// Record that the mock actions know how to filter and update.
pub trait MockRecord: Entity + Clone + Send + Sync + 'static {
    /// Returns true if the record passes the filter `key=value`.
    ///
    /// Unknown keys must not exclude anything.
    fn matches(&self, key: &str, value: &str) -> bool;

    /// Applies opaque field changes.
    fn apply(&mut self, changes: &serde_json::Value);
}

/// Records shared between mock actions and the test asserting on them.
pub struct MockDataset<T> {
    records: Arc<Mutex<Vec<T>>>,
}

impl<T> MockDataset<T> {
    /// Creates a dataset holding `records` in order.
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    fn records(&self) -> MutexGuard<'_, Vec<T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Returns true if no records are left.
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl<T: MockRecord> MockDataset<T> {
    /// Returns every id in order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.records().iter().map(|r| r.id().clone()).collect()
    }

    /// Returns a copy of every record.
    pub fn records_cloned(&self) -> Vec<T> {
        self.records().clone()
    }

    /// Returns the records passing every filter.
    pub fn filtered<'a>(&self, filters: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<T> {
        let filters: Vec<_> = filters.into_iter().collect();
        self.records()
            .iter()
            .filter(|r| filters.iter().all(|(k, v)| r.matches(k, v)))
            .cloned()
            .collect()
    }

    /// Appends a record.
    pub fn push(&self, record: T) {
        self.records().push(record);
    }

    /// Removes the records with the given ids. Returns how many were removed.
    pub fn remove(&self, ids: &[EntityId]) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| !ids.contains(r.id()));
        before - records.len()
    }

    /// Applies `changes` to the records with the given ids. Returns how many
    /// were updated.
    pub fn update(&self, ids: &[EntityId], changes: &serde_json::Value) -> usize {
        let mut updated = 0;
        for record in self.records().iter_mut().filter(|r| ids.contains(r.id())) {
            record.apply(changes);
            updated += 1;
        }
        updated
    }
}

impl<T> Clone for MockDataset<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<T> std::fmt::Debug for MockDataset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDataset")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::subnets;

    #[test]
    fn test_clones_share_records() {
        let data = MockDataset::new(subnets(4));
        let view = data.clone();

        assert_eq!(data.remove(&[view.ids()[1].clone()]), 1);
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_update_applies_changes() {
        let data = MockDataset::new(subnets(3));
        let ids = data.ids();

        assert_eq!(data.update(&ids[..2], &json!({"status": "reserved"})), 2);

        let statuses: Vec<_> = data.records_cloned().into_iter().map(|s| s.status).collect();
        assert_eq!(statuses, ["reserved", "reserved", "active"]);
    }

    #[test]
    fn test_filtered_applies_every_filter() {
        let data = MockDataset::new(subnets(6));
        data.update(&[data.ids()[2].clone()], &json!({"status": "deprecated"}));

        assert_eq!(data.filtered([("status", "deprecated")]).len(), 1);
        assert_eq!(data.filtered([("site", "ams"), ("status", "active")]).len(), 5);
        assert_eq!(data.filtered([("unknown", "x")]).len(), 6);
    }
}
