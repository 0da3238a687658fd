//! Per-screen controller configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tabula_core::permission::Resource;
use tabula_core::{Error, Query, Result};
use validator::Validate;

/// Configuration of one listing screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ControllerConfig {
    /// Resource listed by the screen; selects the capability keys.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "TABULA_RESOURCE", default_value = "subnet")
    )]
    pub resource: Resource,

    /// Records per page when the query string does not name a page size.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "TABULA_PAGE_SIZE", default_value = "10")
    )]
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000."))]
    pub page_size: u32,

    /// Query-string parameter carrying the page number.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "TABULA_PAGE_PARAM", default_value = "page")
    )]
    #[validate(length(min = 1, message = "Parameter name must not be empty."))]
    pub page_param: String,

    /// Query-string parameter carrying the page size.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "TABULA_PAGE_SIZE_PARAM", default_value = "page_size")
    )]
    #[validate(length(min = 1, message = "Parameter name must not be empty."))]
    pub page_size_param: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resource: Resource::Subnet,
            page_size: Query::DEFAULT_PAGE_SIZE,
            page_param: "page".to_owned(),
            page_size_param: "page_size".to_owned(),
        }
    }
}

impl ControllerConfig {
    /// Creates a configuration for the given resource with default paging.
    pub fn for_resource(resource: Resource) -> Self {
        Self {
            resource,
            ..Self::default()
        }
    }

    /// Sets the default page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validates the configuration.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(Error::from)?;

        if self.page_param == self.page_size_param {
            return Err(Error::validation()
                .with_field("page_size_param")
                .with_message("page and page size parameters must differ"));
        }

        Ok(())
    }
}
