//! The user-facing notification channel.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind, TRACING_TARGET_NOTIFY};

/// Type alias for a shared notification sink.
pub type BoxedNotifier = Arc<dyn Notifier>;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// An action completed.
    Success,
    /// User input was corrected or rejected.
    Warning,
    /// An action failed.
    Error,
}

/// A human-readable message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to show.
    pub message: String,
    /// Input field the message belongs to, if any.
    pub field: Option<String>,
    /// When the notice was raised.
    pub created_at: Timestamp,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            field: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates a success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    /// Creates a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    /// Creates an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Associates the notice with an input field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Builds the notice that surfaces `error` to the user.
    ///
    /// Validation errors become warnings; everything else is an error.
    pub fn from_error(error: &Error) -> Self {
        let level = match error.kind() {
            ErrorKind::Validation => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };

        let mut notice = Self::new(level, error.user_message());
        notice.field = error.field.clone();
        notice
    }
}

/// Receives every user-facing notice.
pub trait Notifier: Send + Sync {
    /// Delivers a notice.
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(
                target: TRACING_TARGET_NOTIFY,
                field = notice.field.as_deref(),
                "{}",
                notice.message
            ),
            NoticeLevel::Warning | NoticeLevel::Error => tracing::warn!(
                target: TRACING_TARGET_NOTIFY,
                level = ?notice.level,
                field = notice.field.as_deref(),
                "{}",
                notice.message
            ),
        }
    }
}
