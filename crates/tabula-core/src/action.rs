//! Contracts of the remote fetch and mutation actions.
//!
//! Both actions are external collaborators. The fetch action must be safe to
//! call repeatedly with the same [`Query`]. Neither action is retried
//! automatically; the user re-triggers it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{EntityId, Error, PaginatedResult, Query, Result};

/// Type alias for a shared fetch action.
pub type BoxedFetchAction<T> = Arc<dyn FetchAction<T>>;

/// Type alias for a shared mutation action.
pub type BoxedMutationAction = Arc<dyn MutationAction>;

/// Loads one page of records.
#[async_trait::async_trait]
pub trait FetchAction<T>: Send + Sync {
    /// Fetches the page described by `query`.
    ///
    /// Failures are reported as [`ErrorKind::RemoteFailure`] carrying the
    /// user-facing message.
    ///
    /// [`ErrorKind::RemoteFailure`]: crate::ErrorKind::RemoteFailure
    async fn fetch(&self, query: &Query) -> Result<PaginatedResult<T>>;
}

/// Applies a single or batch mutation.
#[async_trait::async_trait]
pub trait MutationAction: Send + Sync {
    /// Applies `request` to every id it names.
    async fn mutate(&self, request: MutationRequest) -> Result<MutationReceipt>;
}

/// What a mutation does to the records it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    /// Removes the records.
    Delete,
    /// Applies the same changes to every record.
    Update {
        /// Opaque field changes.
        changes: serde_json::Value,
    },
}

impl MutationKind {
    /// Returns true if the mutation removes records.
    #[inline]
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

/// A mutation applied to one or more records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    /// What to do.
    pub kind: MutationKind,
    /// Which records to do it to; never empty when issued by the coordinator.
    pub ids: Vec<EntityId>,
}

impl MutationRequest {
    /// Creates a delete request.
    pub fn delete(ids: Vec<EntityId>) -> Self {
        Self {
            kind: MutationKind::Delete,
            ids,
        }
    }

    /// Creates an update request.
    pub fn update(ids: Vec<EntityId>, changes: serde_json::Value) -> Self {
        Self {
            kind: MutationKind::Update { changes },
            ids,
        }
    }
}

/// Acknowledgement of a successful mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReceipt {
    /// Number of records the mutation applied to.
    pub affected: usize,
}

/// Structured error reported by a remote action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteError {
    /// Machine-readable error code.
    pub code: String,
    /// Input field the error refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Message to show the user verbatim.
    pub user_message: String,
}

impl From<RemoteError> for Error {
    fn from(remote: RemoteError) -> Self {
        let mut error = Error::remote_failure()
            .with_code(remote.code)
            .with_message(remote.user_message);
        error.field = remote.field;
        error
    }
}

/// Wire form of a mutation outcome: `{success: true}` or
/// `{success: false, error: {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Whether the mutation was applied.
    pub success: bool,
    /// Number of records the mutation applied to, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected: Option<usize>,
    /// The failure, when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl MutationResponse {
    /// Converts the wire outcome into a receipt for `request`.
    ///
    /// A failure without an error body, or a success carrying one, is
    /// treated as an unexpected response.
    pub fn into_result(self, request: &MutationRequest) -> Result<MutationReceipt> {
        match (self.success, self.error) {
            (true, None) => Ok(MutationReceipt {
                affected: self.affected.unwrap_or(request.ids.len()),
            }),
            (false, Some(remote)) => Err(remote.into()),
            (success, _) => Err(Error::unexpected().with_message(format!(
                "malformed mutation response (success: {success})"
            ))),
        }
    }
}
