//! Common error type definitions.
//!
//! Every failure the listing core can observe falls into one of four
//! categories, see [`ErrorKind`]. Authorization and validation failures are
//! resolved by the component that detects them; remote and unexpected
//! failures always reach the user through the notification channel.

use std::sync::Arc;

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for shared dynamic errors that can be sent across threads.
///
/// Shared rather than boxed so that a settled error can be cloned into
/// view snapshots.
pub type BoxedError = Arc<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message shown for any failure that was not expected by the orchestration.
const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message shown for a rejected value that carries no message of its own.
const INVALID_VALUE_MESSAGE: &str = "The provided value is not valid.";

/// Categories of errors that can occur while driving a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A capability check failed; the request never reached the network.
    AuthorizationDenied,
    /// User input was rejected locally (e.g. an out-of-range page jump).
    Validation,
    /// The fetch or mutation action returned a structured error.
    RemoteFailure,
    /// Anything else raised while orchestrating the above.
    UnexpectedClient,
}

/// A structured error type for listing operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Machine-readable code supplied by the remote side, if any.
    pub code: Option<String>,
    /// Input field the error refers to, if any.
    pub field: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            code: None,
            field: None,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a remote error code to this error.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Associates this error with an input field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a new authorization denied error.
    pub fn authorization_denied() -> Self {
        Self::new(ErrorKind::AuthorizationDenied)
    }

    /// Creates a new validation error.
    pub fn validation() -> Self {
        Self::new(ErrorKind::Validation)
    }

    /// Creates a new remote failure.
    pub fn remote_failure() -> Self {
        Self::new(ErrorKind::RemoteFailure)
    }

    /// Creates a new unexpected client error.
    pub fn unexpected() -> Self {
        Self::new(ErrorKind::UnexpectedClient)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns true if the error should be rendered as an access-denied view
    /// rather than as a notice.
    pub fn is_authorization_denied(&self) -> bool {
        self.kind == ErrorKind::AuthorizationDenied
    }

    /// Returns the text that should be shown to the user.
    ///
    /// Remote failures are surfaced verbatim. Unexpected errors never leak
    /// their internals and always map to a generic message.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::UnexpectedClient => GENERIC_FAILURE_MESSAGE.to_owned(),
            ErrorKind::AuthorizationDenied => self
                .message
                .clone()
                .unwrap_or_else(|| "You do not have permission to perform this action.".to_owned()),
            ErrorKind::Validation => self
                .message
                .clone()
                .unwrap_or_else(|| INVALID_VALUE_MESSAGE.to_owned()),
            ErrorKind::RemoteFailure => self
                .message
                .clone()
                .unwrap_or_else(|| "The request could not be completed.".to_owned()),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    /// Uses the message attached to the first failing field, by field name.
    ///
    /// The validator's own rendering is kept as the source only.
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(field, failures)| {
                let message = failures
                    .iter()
                    .find_map(|failure| failure.message.as_ref())
                    .map(|message| message.to_string());
                (field.to_string(), message)
            });

        let (field, message) = match first {
            Some((field, message)) => (Some(field), message),
            None => (None, None),
        };

        let mut error = Self::validation()
            .with_message(message.unwrap_or_else(|| INVALID_VALUE_MESSAGE.to_owned()))
            .with_source(errors);
        error.field = field;
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let error = Error::remote_failure().with_message("Subnet is in use");
        assert_eq!(error.to_string(), "remote_failure: Subnet is in use");
        assert_eq!(Error::validation().to_string(), "validation");
    }

    #[test]
    fn test_remote_message_is_verbatim() {
        let error = Error::remote_failure()
            .with_code("IN_USE")
            .with_field("cidr")
            .with_message("CIDR overlaps an existing subnet");

        assert_eq!(error.user_message(), "CIDR overlaps an existing subnet");
        assert_eq!(error.code.as_deref(), Some("IN_USE"));
        assert_eq!(error.field.as_deref(), Some("cidr"));
    }

    #[test]
    fn test_validation_errors_use_field_message() {
        use std::error::Error as _;

        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "page",
            validator::ValidationError::new("range").with_message("Page must be at least 1.".into()),
        );

        let error = Error::from(errors);
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.field.as_deref(), Some("page"));
        assert_eq!(error.user_message(), "Page must be at least 1.");
        assert!(error.source().is_some());
    }

    #[test]
    fn test_validation_errors_without_message_stay_readable() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("page_size", validator::ValidationError::new("range"));

        let error = Error::from(errors);
        assert_eq!(error.user_message(), INVALID_VALUE_MESSAGE);
        assert_eq!(error.field.as_deref(), Some("page_size"));
    }

    #[test]
    fn test_unexpected_message_is_generic() {
        let error = Error::unexpected().with_message("index out of bounds");
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(error.kind_str(), "unexpected_client");
    }
}
