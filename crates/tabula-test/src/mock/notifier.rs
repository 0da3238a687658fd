//! Notifier that keeps what it receives.

use std::sync::{Mutex, PoisonError};

use tabula_core::{Notice, Notifier};

/// Records every notice for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Creates a notifier with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every notice received so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets every recorded notice.
    pub fn clear(&self) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
