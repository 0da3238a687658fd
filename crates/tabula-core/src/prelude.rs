//! Convenient re-exports for common use.

pub use crate::permission::{Actor, Capabilities, Capability, PermissionGate, Resource, Role};
pub use crate::{
    Entity, EntityId, Error, ErrorKind, FetchAction, MutationAction, MutationRequest, Notice,
    Notifier, PaginatedResult, Query, Result,
};
