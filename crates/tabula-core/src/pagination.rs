//! Page requests and page results.
//!
//! [`Query`] is the sole payload sent to a fetch action, and
//! [`PaginatedResult`] is what comes back. A result is always replaced
//! wholesale on every fetch, never patched in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Entity, EntityId, Error, Result};

/// Page parameters and filters for a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// One-based page number.
    #[validate(range(min = 1, message = "Page must be at least 1."))]
    pub page: u32,

    /// Number of records per page.
    ///
    /// Capped to keep a single page cheap for the remote side.
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000."))]
    pub page_size: u32,

    /// Opaque filter parameters, forwarded verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl Query {
    /// Default page size.
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    /// Largest accepted page size.
    pub const MAX_PAGE_SIZE: u32 = 1000;

    /// Returns a new [`Query`] without filters.
    #[inline]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            filters: BTreeMap::new(),
        }
    }

    /// Returns a [`Query`] for the given page.
    #[inline]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Returns a [`Query`] with the filter set.
    #[inline]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Validates the query, returning a validation error on failure.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(Error::from)
    }

    /// Returns the number of records to skip for this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of records plus the counts needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    /// Records in server-assigned order.
    pub data: Vec<T>,
    /// Number of records across all pages.
    pub total_count: u64,
    /// One-based page number this result was produced for.
    pub current_page: u32,
    /// Number of pages, zero when there are no records.
    pub total_pages: u32,
    /// Page size this result was produced with.
    pub page_size: u32,
}

impl<T> PaginatedResult<T> {
    /// Returns the "no data" result.
    pub fn empty(page_size: u32) -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            current_page: 1,
            total_pages: 0,
            page_size: page_size.max(1),
        }
    }

    /// Builds a result for `query` from its page of records and the total.
    pub fn from_page(data: Vec<T>, total_count: u64, query: &Query) -> Self {
        Self {
            data,
            total_count,
            current_page: query.page.max(1),
            total_pages: Self::total_pages_for(total_count, query.page_size),
            page_size: query.page_size.max(1),
        }
    }

    /// Computes `ceil(total_count / page_size)`.
    pub fn total_pages_for(total_count: u64, page_size: u32) -> u32 {
        let page_size = u64::from(page_size.max(1));
        u32::try_from(total_count.div_ceil(page_size)).unwrap_or(u32::MAX)
    }

    /// Checks the structural invariants of a fetched result.
    ///
    /// `current_page` may exceed `total_pages` right after the last record
    /// of the last page was removed; that state is valid and is what page
    /// correction looks for.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::unexpected().with_message("page size must be positive"));
        }
        if self.current_page == 0 {
            return Err(Error::unexpected().with_message("current page must be positive"));
        }
        if self.data.len() > self.page_size as usize {
            return Err(Error::unexpected().with_message(format!(
                "page holds {} records but page size is {}",
                self.data.len(),
                self.page_size
            )));
        }

        let expected = Self::total_pages_for(self.total_count, self.page_size);
        if self.total_pages != expected {
            return Err(Error::unexpected().with_message(format!(
                "total pages is {} but {} records at {} per page need {}",
                self.total_pages, self.total_count, self.page_size, expected
            )));
        }

        Ok(())
    }

    /// Returns true if this page holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of records on this page.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if a later page exists.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Returns true if an earlier page exists.
    #[inline]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

impl<T: Entity> PaginatedResult<T> {
    /// Returns the ids of this page's records, in page order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.data.iter().map(|item| item.id().clone()).collect()
    }
}
