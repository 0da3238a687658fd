//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── controller: ControllerConfig # Resource, page size, parameter names
//! ├── mock: MockActionConfig       # Simulated latency
//! └── session: SessionConfig       # User, records, URL, script
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.

mod session;

use std::process;

use clap::Parser;
use serde::{Deserialize, Serialize};
pub use session::SessionConfig;
use tabula_client::ControllerConfig;
use tabula_test::MockActionConfig;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "tabula")]
#[command(about = "Drive a paginated admin listing from the terminal")]
#[command(version)]
pub struct Cli {
    /// Listing screen configuration.
    #[clap(flatten)]
    pub controller: ControllerConfig,

    /// Mock backend configuration.
    #[clap(flatten)]
    pub mock: MockActionConfig,

    /// Session configuration.
    #[clap(flatten)]
    pub session: SessionConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs build information and the effective configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "starting tabula"
        );

        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            pid = process::id(),
            features = ?enabled_features(),
            "build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            resource = %self.controller.resource,
            page_size = self.controller.page_size,
            page_param = %self.controller.page_param,
            page_size_param = %self.controller.page_size_param,
            latency_ms = self.mock.latency_ms,
            role = self.session.role.as_ref().map(AsRef::<str>::as_ref),
            records = self.session.records,
            url = %self.session.url,
            "configuration"
        );
    }
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}
