#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for permission checks and capability projection.
pub const TRACING_TARGET_AUTHORIZATION: &str = "tabula_core::authorization";

/// Tracing target for user-facing notices.
pub const TRACING_TARGET_NOTIFY: &str = "tabula_core::notify";

mod action;
mod entity;
mod error;
mod notify;
mod pagination;

pub mod permission;
pub mod prelude;

pub use action::{
    BoxedFetchAction, BoxedMutationAction, FetchAction, MutationAction, MutationKind,
    MutationReceipt, MutationRequest, MutationResponse, RemoteError,
};
pub use entity::{Entity, EntityId};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use notify::{BoxedNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use pagination::{PaginatedResult, Query};
