//! Page number binding between the listing and the query string.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tabula_core::{BoxedNotifier, Error, Notice, Query, Result};

use crate::{BoxedQueryStore, ControllerConfig, TRACING_TARGET_NAVIGATOR};

#[derive(Debug, Default)]
struct NavigatorState {
    /// Page count of the last settled fetch; `None` before the first one.
    total_pages: Option<u32>,
    /// Contents of the jump-to-page input field.
    jump_input: String,
}

/// Owns the page number of a listing.
///
/// The page lives in the query store, which is the single source of truth.
/// Navigating only writes the store; fetching is driven by whoever observes
/// it.
pub struct PageNavigator {
    store: BoxedQueryStore,
    notifier: BoxedNotifier,
    page_param: String,
    page_size_param: String,
    default_page_size: u32,
    state: Mutex<NavigatorState>,
}

impl PageNavigator {
    /// Creates a navigator over `store`.
    pub fn new(store: BoxedQueryStore, notifier: BoxedNotifier, config: &ControllerConfig) -> Self {
        let navigator = Self {
            store,
            notifier,
            page_param: config.page_param.clone(),
            page_size_param: config.page_size_param.clone(),
            default_page_size: config.page_size,
            state: Mutex::new(NavigatorState::default()),
        };

        let page = navigator.current_page();
        navigator.state().jump_input = page.to_string();
        navigator
    }

    fn state(&self) -> MutexGuard<'_, NavigatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the page number from the query store.
    ///
    /// Absent, non-numeric and zero values read as page 1.
    pub fn current_page(&self) -> u32 {
        self.store
            .get(&self.page_param)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    /// Returns the page size from the query store, or the configured default.
    pub fn page_size(&self) -> u32 {
        self.store
            .get(&self.page_size_param)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|size| (1..=Query::MAX_PAGE_SIZE).contains(size))
            .unwrap_or(self.default_page_size)
    }

    /// Returns the page count of the last settled fetch, zero before one.
    pub fn total_pages(&self) -> u32 {
        self.state().total_pages.unwrap_or(0)
    }

    /// Records the page count of a settled fetch.
    pub fn set_total_pages(&self, total_pages: u32) {
        let page = self.current_page();
        let mut state = self.state();
        state.total_pages = Some(total_pages);
        state.jump_input = page.to_string();
    }

    /// Returns the contents of the jump-to-page input.
    pub fn jump_input(&self) -> String {
        self.state().jump_input.clone()
    }

    /// Replaces the contents of the jump-to-page input as the user types.
    pub fn set_jump_input(&self, raw: impl Into<String>) {
        self.state().jump_input = raw.into();
    }

    /// Navigates to `page`, preserving every other query parameter.
    ///
    /// The page is clamped into the known range; with no records at all the
    /// only page is 1. Returns the page navigated to.
    pub fn go_to(&self, page: u32) -> u32 {
        let total_pages = self.state().total_pages;
        let last = total_pages.map_or(u32::MAX, |total| total.max(1));
        let page = page.clamp(1, last);

        let value = page.to_string();
        self.store.update(&[(self.page_param.as_str(), Some(value.as_str()))]);
        self.state().jump_input = value;

        tracing::debug!(
            target: TRACING_TARGET_NAVIGATOR,
            page,
            total_pages = total_pages.unwrap_or(0),
            "navigated"
        );

        page
    }

    /// Parses the jump-to-page input and navigates to it.
    ///
    /// Input that is not an integer, below 1 or past the last page is
    /// rejected: the input reverts to the current page, a notice is raised
    /// and no navigation happens.
    pub fn jump_to_page(&self, raw: &str) -> Result<u32> {
        match self.parse_jump(raw) {
            Ok(page) => Ok(self.go_to(page)),
            Err(error) => {
                let current = self.current_page();
                self.state().jump_input = current.to_string();

                tracing::debug!(
                    target: TRACING_TARGET_NAVIGATOR,
                    input = raw,
                    current,
                    "rejected page jump"
                );

                self.notifier.notify(Notice::from_error(&error));
                Err(error)
            }
        }
    }

    fn parse_jump(&self, raw: &str) -> Result<u32> {
        let last = self.total_pages().max(1);
        let out_of_range = || {
            Error::validation()
                .with_field("page")
                .with_message(format!("Page must be between 1 and {last}."))
        };

        let page = raw.trim().parse::<i64>().map_err(|_| {
            Error::validation()
                .with_field("page")
                .with_message("Please enter a valid page number.")
        })?;

        if page < 1 || page > i64::from(last) {
            return Err(out_of_range());
        }

        u32::try_from(page).map_err(|_| out_of_range())
    }

    /// Builds the fetch query from the store.
    ///
    /// Every parameter other than the page and page size is a filter.
    pub fn query(&self) -> Query {
        let mut query = Query::new(self.current_page(), self.page_size());
        for (key, value) in self.store.params() {
            if key != self.page_param && key != self.page_size_param {
                query.filters.entry(key).or_insert(value);
            }
        }
        query
    }

    /// Sets a filter and returns to the first page.
    pub fn set_filter(&self, key: &str, value: &str) {
        self.store
            .update(&[(key, Some(value)), (self.page_param.as_str(), Some("1"))]);
        self.state().jump_input = "1".to_owned();
    }

    /// Removes a filter and returns to the first page.
    pub fn clear_filter(&self, key: &str) {
        self.store
            .update(&[(key, None), (self.page_param.as_str(), Some("1"))]);
        self.state().jump_input = "1".to_owned();
    }
}

impl std::fmt::Debug for PageNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageNavigator")
            .field("page_param", &self.page_param)
            .field("page_size_param", &self.page_size_param)
            .field("default_page_size", &self.default_page_size)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabula_core::{ErrorKind, NoticeLevel};
    use tabula_test::RecordingNotifier;

    use super::*;
    use crate::{QueryStore, UrlQueryStore};

    fn navigator(url: &str) -> (PageNavigator, Arc<UrlQueryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(UrlQueryStore::parse(url).unwrap());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = PageNavigator::new(
            store.clone(),
            notifier.clone(),
            &ControllerConfig::default(),
        );
        (navigator, store, notifier)
    }

    #[test]
    fn test_current_page_defaults_to_one() {
        let (navigator, store, _) = navigator("https://admin.local/vlans");
        assert_eq!(navigator.current_page(), 1);

        store.update(&[("page", Some("abc"))]);
        assert_eq!(navigator.current_page(), 1);

        store.update(&[("page", Some("0"))]);
        assert_eq!(navigator.current_page(), 1);

        store.update(&[("page", Some("4"))]);
        assert_eq!(navigator.current_page(), 4);
    }

    #[test]
    fn test_go_to_preserves_other_parameters() {
        let (navigator, store, _) = navigator("https://admin.local/ips?subnet=10.0.0.0%2F24&page=1");
        navigator.set_total_pages(5);

        assert_eq!(navigator.go_to(3), 3);

        assert_eq!(
            store.url().as_str(),
            "https://admin.local/ips?subnet=10.0.0.0%2F24&page=3"
        );
        assert_eq!(navigator.jump_input(), "3");
    }

    #[test]
    fn test_go_to_clamps_with_no_records() {
        let (navigator, _, _) = navigator("https://admin.local/vlans?page=2");
        navigator.set_total_pages(0);

        assert_eq!(navigator.go_to(0), 1);
        assert_eq!(navigator.go_to(7), 1);
        assert_eq!(navigator.current_page(), 1);
    }

    #[test]
    fn test_jump_past_last_page_is_rejected() {
        let (navigator, _, notifier) = navigator("https://admin.local/subnets?page=2");
        navigator.set_total_pages(3);
        navigator.set_jump_input("4");

        let error = navigator.jump_to_page("4").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.user_message(), "Page must be between 1 and 3.");
        assert_eq!(navigator.current_page(), 2);
        assert_eq!(navigator.jump_input(), "2");

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].field.as_deref(), Some("page"));
    }

    #[test]
    fn test_jump_with_garbage_restores_input() {
        let (navigator, store, notifier) = navigator("https://admin.local/subnets?page=2");
        navigator.set_total_pages(3);
        navigator.set_jump_input("abc");

        assert!(navigator.jump_to_page("abc").is_err());
        assert_eq!(navigator.jump_input(), "2");
        assert_eq!(store.get("page").as_deref(), Some("2"));
        assert_eq!(notifier.notices()[0].message, "Please enter a valid page number.");

        assert!(navigator.jump_to_page("0").is_err());
        assert!(navigator.jump_to_page("-3").is_err());
        assert_eq!(navigator.current_page(), 2);
    }

    #[test]
    fn test_jump_with_no_records_only_accepts_first_page() {
        let (navigator, _, _) = navigator("https://admin.local/subnets");
        navigator.set_total_pages(0);

        assert!(navigator.jump_to_page("2").is_err());
        assert_eq!(navigator.jump_to_page("1").unwrap(), 1);
    }

    #[test]
    fn test_valid_jump_navigates() {
        let (navigator, _, notifier) = navigator("https://admin.local/subnets?page=1");
        navigator.set_total_pages(3);

        assert_eq!(navigator.jump_to_page(" 3 ").unwrap(), 3);
        assert_eq!(navigator.current_page(), 3);
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_query_collects_filters() {
        let (navigator, _, _) = navigator("https://admin.local/ips?page=2&page_size=25&status=free");
        let query = navigator.query();

        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 25);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters["status"], "free");
    }

    #[test]
    fn test_invalid_page_size_falls_back_to_default() {
        let (navigator, _, _) = navigator("https://admin.local/ips?page_size=5000");
        assert_eq!(navigator.page_size(), Query::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_filter_change_returns_to_first_page() {
        let (navigator, store, _) = navigator("https://admin.local/ips?page=4");

        navigator.set_filter("status", "reserved");
        assert_eq!(store.url().query(), Some("page=1&status=reserved"));

        navigator.clear_filter("status");
        assert_eq!(store.url().query(), Some("page=1"));
    }
}
