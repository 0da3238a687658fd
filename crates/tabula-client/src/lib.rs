#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for fetch lifecycle events.
pub const TRACING_TARGET_CONTROLLER: &str = "tabula_client::controller";

/// Tracing target for page navigation and jump validation.
pub const TRACING_TARGET_NAVIGATOR: &str = "tabula_client::navigator";

/// Tracing target for row selection.
pub const TRACING_TARGET_SELECTION: &str = "tabula_client::selection";

/// Tracing target for mutations and page correction.
pub const TRACING_TARGET_MUTATION: &str = "tabula_client::mutation";

mod config;
mod controller;
mod mutation;
mod navigator;
mod selection;
mod store;

pub use config::ControllerConfig;
pub use controller::{
    AuthStatus, ControllerPhase, ControllerSnapshot, EntityManagementController, LoadOutcome,
    PageSummary,
};
pub use mutation::{MutationCoordinator, MutationOutcome};
pub use navigator::PageNavigator;
pub use selection::{SelectionSummary, SelectionTracker, Tristate};
pub use store::{BoxedQueryStore, QueryStore, UrlQueryStore};
