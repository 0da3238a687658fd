//! Row selection within the loaded page.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tabula_core::{EntityId, Error};

use crate::TRACING_TARGET_SELECTION;

/// Value of a header checkbox.
///
/// `Indeterminate` is a display state only. Convert with
/// [`Tristate::into_command`] or `bool::try_from` before calling anything
/// that mutates the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    /// Every row is selected.
    Checked,
    /// No row is selected.
    Unchecked,
    /// Some, but not all, rows are selected.
    Indeterminate,
}

impl Tristate {
    /// Normalizes a checkbox value into a select-all command.
    ///
    /// `Indeterminate` clears the selection.
    #[inline]
    pub const fn into_command(self) -> bool {
        matches!(self, Self::Checked)
    }
}

impl From<bool> for Tristate {
    #[inline]
    fn from(checked: bool) -> Self {
        if checked { Self::Checked } else { Self::Unchecked }
    }
}

impl TryFrom<Tristate> for bool {
    type Error = Error;

    fn try_from(value: Tristate) -> Result<Self, Self::Error> {
        match value {
            Tristate::Checked => Ok(true),
            Tristate::Unchecked => Ok(false),
            Tristate::Indeterminate => Err(Error::validation()
                .with_message("an indeterminate checkbox is not a selection command")),
        }
    }
}

/// Derived view of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Number of selected rows.
    pub count: usize,
    /// Header checkbox value.
    pub header: Tristate,
}

impl SelectionSummary {
    /// Returns true if nothing is selected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Tracks which rows of the currently loaded page are selected.
///
/// Every selected id is an id of the current page. Loading new data goes
/// through [`SelectionTracker::reset`], which drops the whole selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    ids: Vec<EntityId>,
    selected: HashSet<EntityId>,
    generation: u64,
}

impl SelectionTracker {
    /// Creates an empty tracker for an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the page's ids and clears the selection.
    pub fn reset(&mut self, ids: Vec<EntityId>) {
        self.ids = ids;
        self.selected.clear();
        self.generation += 1;

        tracing::trace!(
            target: TRACING_TARGET_SELECTION,
            generation = self.generation,
            rows = self.ids.len(),
            "selection reset"
        );
    }

    /// Selects every row of the page, or clears the selection.
    pub fn select_all(&mut self, select: bool) {
        if select {
            self.selected = self.ids.iter().cloned().collect();
        } else {
            self.selected.clear();
        }
    }

    /// Selects or deselects one row. Returns false if the id is not on the
    /// current page, in which case nothing changes.
    pub fn select_one(&mut self, id: &EntityId, select: bool) -> bool {
        if !self.ids.contains(id) {
            tracing::debug!(
                target: TRACING_TARGET_SELECTION,
                id = %id,
                "ignoring selection of a row that is not on the page"
            );
            return false;
        }

        if select {
            self.selected.insert(id.clone());
        } else {
            self.selected.remove(id);
        }

        true
    }

    /// Clears the selection, keeping the page's ids.
    #[inline]
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Returns true if the row is selected.
    #[inline]
    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selected.contains(id)
    }

    /// Returns the selected ids in page order.
    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.ids
            .iter()
            .filter(|id| self.selected.contains(*id))
            .cloned()
            .collect()
    }

    /// Returns the number of data changes seen so far.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Derives the count and the header checkbox value.
    pub fn derived_state(&self) -> SelectionSummary {
        let count = self.selected.len();
        let header = match count {
            0 => Tristate::Unchecked,
            n if n == self.ids.len() => Tristate::Checked,
            _ => Tristate::Indeterminate,
        };

        SelectionSummary { count, header }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().copied().map(EntityId::from).collect()
    }

    fn tracker(raw: &[&str]) -> SelectionTracker {
        let mut tracker = SelectionTracker::new();
        tracker.reset(ids(raw));
        tracker
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut tracker = tracker(&["a", "b", "c"]);

        tracker.select_all(true);
        assert_eq!(tracker.derived_state().header, Tristate::Checked);
        assert_eq!(tracker.derived_state().count, 3);

        tracker.select_all(false);
        assert_eq!(tracker.derived_state().header, Tristate::Unchecked);
        assert!(tracker.derived_state().is_empty());
    }

    #[test]
    fn test_partial_selection_is_indeterminate() {
        let mut tracker = tracker(&["a", "b", "c"]);
        assert!(tracker.select_one(&"b".into(), true));

        let summary = tracker.derived_state();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.header, Tristate::Indeterminate);

        assert!(tracker.select_one(&"b".into(), false));
        assert_eq!(tracker.derived_state().header, Tristate::Unchecked);
    }

    #[test]
    fn test_empty_page_is_never_all() {
        let mut tracker = tracker(&[]);
        tracker.select_all(true);
        assert_eq!(tracker.derived_state().header, Tristate::Unchecked);
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut tracker = tracker(&["a"]);
        assert!(!tracker.select_one(&"zz".into(), true));
        assert!(tracker.derived_state().is_empty());
        assert!(!tracker.is_selected(&"zz".into()));
    }

    #[test]
    fn test_reset_drops_stale_selection() {
        let mut tracker = tracker(&["a", "b"]);
        tracker.select_all(true);

        tracker.reset(ids(&["b", "c"]));

        assert_eq!(tracker.derived_state().header, Tristate::Unchecked);
        assert!(tracker.selected_ids().is_empty());
        assert_eq!(tracker.generation(), 2);
    }

    #[test]
    fn test_selected_ids_follow_page_order() {
        let mut tracker = tracker(&["a", "b", "c"]);
        tracker.select_one(&"c".into(), true);
        tracker.select_one(&"a".into(), true);
        assert_eq!(tracker.selected_ids(), ids(&["a", "c"]));
    }

    #[test]
    fn test_indeterminate_is_not_a_command() {
        assert!(!Tristate::Indeterminate.into_command());
        assert!(Tristate::Checked.into_command());
        assert!(bool::try_from(Tristate::Indeterminate).is_err());
        assert!(bool::try_from(Tristate::Checked).unwrap());
        assert_eq!(Tristate::from(false), Tristate::Unchecked);
    }
}
