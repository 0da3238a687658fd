//! Mock fetch action over a [`MockDataset`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tabula_core::{Error, FetchAction, PaginatedResult, Query, Result};

use super::{Fault, MockDataset, MockRecord};

/// Configuration shared by the mock actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockActionConfig {
    /// Simulated round-trip latency of every call, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "mock-latency-ms", env = "TABULA_MOCK_LATENCY_MS", default_value_t = 0)
    )]
    pub latency_ms: u64,
}

impl MockActionConfig {
    /// Returns the latency as a duration.
    #[inline]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Default)]
struct FetchState {
    faults: VecDeque<Fault>,
    latency: Duration,
    last_query: Option<Query>,
}

/// Serves pages of a [`MockDataset`], applying query filters.
#[derive(Debug)]
pub struct MockFetchAction<T> {
    data: MockDataset<T>,
    calls: AtomicUsize,
    state: Mutex<FetchState>,
}

impl<T: MockRecord> MockFetchAction<T> {
    /// Creates an action serving `data` with no latency.
    pub fn new(data: MockDataset<T>) -> Self {
        Self::with_config(data, &MockActionConfig::default())
    }

    /// Creates an action serving `data` as configured.
    pub fn with_config(data: MockDataset<T>, config: &MockActionConfig) -> Self {
        Self {
            data,
            calls: AtomicUsize::new(0),
            state: Mutex::new(FetchState {
                latency: config.latency(),
                ..FetchState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of fetches requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the query of the most recent fetch.
    pub fn last_query(&self) -> Option<Query> {
        self.state().last_query.clone()
    }

    /// Delays every following fetch by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Makes the next fetch fail with `error`.
    pub fn fail_next(&self, error: Error) {
        self.state().faults.push_back(Fault::Fail(error));
    }

    /// Makes the next fetch panic.
    pub fn panic_next(&self) {
        self.state().faults.push_back(Fault::Panic);
    }

    /// Makes the next fetch return a result whose page count does not
    /// match its total.
    pub fn corrupt_next(&self) {
        self.state().faults.push_back(Fault::Corrupt);
    }

    fn page(&self, query: &Query) -> PaginatedResult<T> {
        let matching = self
            .data
            .filtered(query.filters.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let total_count = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .collect();

        PaginatedResult::from_page(data, total_count, query)
    }
}

#[async_trait::async_trait]
impl<T: MockRecord> FetchAction<T> for MockFetchAction<T> {
    async fn fetch(&self, query: &Query) -> Result<PaginatedResult<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (fault, latency) = {
            let mut state = self.state();
            state.last_query = Some(query.clone());
            (state.faults.pop_front(), state.latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match fault {
            None => Ok(self.page(query)),
            Some(Fault::Fail(error)) => Err(error),
            Some(Fault::Panic) => panic!("mock fetch action panicked"),
            Some(Fault::Corrupt) => {
                let mut result = self.page(query);
                result.total_pages += 1;
                Ok(result)
            }
        }
    }
}
