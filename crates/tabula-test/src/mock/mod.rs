//! Mock collaborators for testing.
//!
//! Every mock shares its records through a [`MockDataset`], so a mutation
//! applied by [`MockMutationAction`] is visible to the next fetch made by
//! [`MockFetchAction`].

mod dataset;
mod fetch;
mod mutation;
mod notifier;
mod subnet;

pub use dataset::{MockDataset, MockRecord};
pub use fetch::{MockActionConfig, MockFetchAction};
pub use mutation::MockMutationAction;
pub use notifier::RecordingNotifier;
pub use subnet::{Subnet, subnets};
use tabula_core::permission::{Actor, Role};
use uuid::Uuid;

/// Creates a signed-in user holding `role`.
pub fn actor(role: Role) -> Actor {
    Actor::new(Uuid::now_v7().to_string(), role.as_ref(), role)
}

/// Fault to inject into the next call of a mock action.
#[derive(Debug, Clone)]
enum Fault {
    Fail(tabula_core::Error),
    Panic,
    Corrupt,
}
