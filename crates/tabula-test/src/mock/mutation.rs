//! Mock mutation action over a [`MockDataset`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tabula_core::{
    Error, MutationAction, MutationKind, MutationReceipt, MutationRequest, MutationResponse,
    RemoteError, Result,
};

use super::{Fault, MockActionConfig, MockDataset, MockRecord};

#[derive(Debug, Default)]
struct MutationState {
    faults: VecDeque<Fault>,
    requests: Vec<MutationRequest>,
}

/// Deletes and updates records of a [`MockDataset`].
///
/// A request naming no existing record fails with a `NOT_FOUND` remote
/// error, as a real backend would.
#[derive(Debug)]
pub struct MockMutationAction<T> {
    data: MockDataset<T>,
    latency: Duration,
    calls: AtomicUsize,
    state: Mutex<MutationState>,
}

impl<T: MockRecord> MockMutationAction<T> {
    /// Creates an action mutating `data` with no latency.
    pub fn new(data: MockDataset<T>) -> Self {
        Self::with_config(data, &MockActionConfig::default())
    }

    /// Creates an action mutating `data` as configured.
    pub fn with_config(data: MockDataset<T>, config: &MockActionConfig) -> Self {
        Self {
            data,
            latency: config.latency(),
            calls: AtomicUsize::new(0),
            state: Mutex::new(MutationState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MutationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of mutations requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns every request received, oldest first.
    pub fn requests(&self) -> Vec<MutationRequest> {
        self.state().requests.clone()
    }

    /// Makes the next mutation fail with `error`.
    pub fn fail_next(&self, error: Error) {
        self.state().faults.push_back(Fault::Fail(error));
    }

    /// Makes the next mutation panic.
    pub fn panic_next(&self) {
        self.state().faults.push_back(Fault::Panic);
    }

    fn apply(&self, request: &MutationRequest) -> MutationResponse {
        let affected = match &request.kind {
            MutationKind::Delete => self.data.remove(&request.ids),
            MutationKind::Update { changes } => self.data.update(&request.ids, changes),
        };

        if affected == 0 {
            return MutationResponse {
                success: false,
                affected: None,
                error: Some(RemoteError {
                    code: "NOT_FOUND".to_owned(),
                    field: None,
                    user_message: "The selected records no longer exist.".to_owned(),
                }),
            };
        }

        MutationResponse {
            success: true,
            affected: Some(affected),
            error: None,
        }
    }
}

#[async_trait::async_trait]
impl<T: MockRecord> MutationAction for MockMutationAction<T> {
    async fn mutate(&self, request: MutationRequest) -> Result<MutationReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let fault = {
            let mut state = self.state();
            state.requests.push(request.clone());
            state.faults.pop_front()
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match fault {
            None | Some(Fault::Corrupt) => self.apply(&request).into_result(&request),
            Some(Fault::Fail(error)) => Err(error),
            Some(Fault::Panic) => panic!("mock mutation action panicked"),
        }
    }
}
