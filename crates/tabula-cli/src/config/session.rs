//! Session configuration.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};
use tabula_core::permission::Role;

/// Who is signed in and what they are looking at.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Role of the signed-in user; nobody is signed in when omitted.
    #[arg(long, env = "TABULA_ROLE")]
    pub role: Option<Role>,

    /// Number of sample records to serve.
    #[arg(long, env = "TABULA_RECORDS", default_value_t = 23)]
    pub records: usize,

    /// Listing URL; its query string holds the page and the filters.
    #[arg(long, env = "TABULA_URL", default_value = "https://admin.local/subnets")]
    pub url: String,

    /// File of commands to run, one per line; standard input when omitted.
    #[arg(long, env = "TABULA_SCRIPT")]
    pub script: Option<PathBuf>,
}
