//! Fetch lifecycle of one listing screen.
//!
//! All state sits behind a single mutex that is never held across an
//! `.await`. The fetch is the only suspension point; everything before and
//! after it happens in one synchronous step, so the only intermediate state
//! another task can observe is [`ControllerPhase::Loading`].
//!
//! Every issued fetch takes the next value of a generation counter. A result
//! is applied only if its token is still the latest one issued; anything
//! else is discarded as stale.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tabula_core::permission::{Actor, Capabilities, Resource};
use tabula_core::{
    BoxedFetchAction, BoxedNotifier, Entity, EntityId, Error, Notice, PaginatedResult, Query,
    Result, TracingNotifier,
};

use crate::{
    BoxedQueryStore, ControllerConfig, PageNavigator, SelectionSummary, SelectionTracker,
    TRACING_TARGET_CONTROLLER,
};

/// Whether the acting user is known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// The user is still being resolved; nothing may be fetched.
    Loading,
    /// The user is known; `None` means nobody is signed in.
    Resolved(Option<Actor>),
}

/// Where the screen is in its fetch lifecycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerPhase {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// Waiting for the user to resolve or for a fetch to settle.
    Loading,
    /// The last fetch succeeded.
    Ready,
    /// The last fetch failed.
    Failed,
    /// The user may not view this resource.
    Denied,
}

/// Counts of a settled page, used to decide what happens next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    /// Page the result was produced for.
    pub current_page: u32,
    /// Page count after the fetch.
    pub total_pages: u32,
    /// Record count after the fetch.
    pub total_count: u64,
    /// Records on the page.
    pub len: usize,
}

impl PageSummary {
    fn of<T>(result: &PaginatedResult<T>) -> Self {
        Self {
            current_page: result.current_page,
            total_pages: result.total_pages,
            total_count: result.total_count,
            len: result.data.len(),
        }
    }

    /// Returns true if the page is empty only because it lies past the
    /// last page.
    pub fn is_past_end(&self) -> bool {
        self.len == 0 && self.current_page > 1 && self.current_page > self.total_pages
    }
}

/// How a call to [`EntityManagementController::load`] ended.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The result was stored.
    Applied(PageSummary),
    /// An identical load was already in flight; nothing was requested.
    Coalesced,
    /// A newer load was issued while this one was in flight; its result was
    /// dropped.
    Stale,
    /// The user is not resolved yet; nothing was requested.
    AwaitingAuth,
    /// The user may not view the resource; nothing was requested.
    Denied,
    /// The fetch failed; the error was surfaced to the user.
    Failed(Error),
}

impl LoadOutcome {
    /// Returns the summary of an applied result.
    pub fn applied(&self) -> Option<PageSummary> {
        match self {
            Self::Applied(summary) => Some(*summary),
            _ => None,
        }
    }
}

/// Point-in-time view of a screen, for rendering.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot<T> {
    /// Lifecycle phase.
    pub phase: ControllerPhase,
    /// The current page of records.
    pub result: PaginatedResult<T>,
    /// The error of the last failed fetch.
    pub error: Option<Error>,
    /// Selection count and header checkbox value.
    pub selection: SelectionSummary,
    /// Selected ids in page order.
    pub selected_ids: Vec<EntityId>,
    /// Capability flags of the acting user.
    pub capabilities: Capabilities,
    /// Page number from the query string.
    pub current_page: u32,
    /// Contents of the jump-to-page input.
    pub jump_input: String,
}

impl<T> ControllerSnapshot<T> {
    /// Returns true while a spinner should be shown.
    pub fn is_loading(&self) -> bool {
        self.phase == ControllerPhase::Loading
    }

    /// Returns true when the "no records" state should be shown.
    pub fn is_empty(&self) -> bool {
        self.phase == ControllerPhase::Ready && self.result.is_empty()
    }

    /// Returns true when the access-denied view replaces the listing.
    pub fn show_access_denied(&self) -> bool {
        self.phase == ControllerPhase::Denied
    }

    /// Returns true when the create control should be rendered.
    pub fn show_create(&self) -> bool {
        self.capabilities.can_create
    }

    /// Returns true when row selection and the batch-delete control should
    /// be rendered.
    pub fn show_batch_delete(&self) -> bool {
        self.capabilities.can_delete
    }
}

#[derive(Debug)]
struct InFlight {
    token: u64,
    query: Query,
}

struct ControllerState<T> {
    auth: AuthStatus,
    capabilities: Capabilities,
    phase: ControllerPhase,
    result: PaginatedResult<T>,
    error: Option<Error>,
    selection: SelectionTracker,
    latest_token: u64,
    in_flight: Option<InFlight>,
}

impl<T> ControllerState<T> {
    /// Forgets any in-flight fetch so that its result is discarded.
    fn invalidate(&mut self) {
        self.latest_token += 1;
        self.in_flight = None;
    }

    fn clear(&mut self, page_size: u32) {
        self.result = PaginatedResult::empty(page_size);
        self.error = None;
        self.selection.reset(Vec::new());
    }
}

/// Drives fetching, authorization and selection for one listing.
pub struct EntityManagementController<T> {
    resource: Resource,
    fetcher: BoxedFetchAction<T>,
    notifier: BoxedNotifier,
    navigator: PageNavigator,
    state: Mutex<ControllerState<T>>,
}

impl<T> EntityManagementController<T>
where
    T: Entity + Clone + Send + Sync + 'static,
{
    /// Creates a controller that notifies through the log.
    pub fn new(
        config: ControllerConfig,
        fetcher: BoxedFetchAction<T>,
        store: BoxedQueryStore,
    ) -> Result<Self> {
        Self::with_notifier(config, fetcher, store, Arc::new(TracingNotifier))
    }

    /// Creates a controller with an explicit notification channel.
    ///
    /// The controller starts with the user unresolved.
    pub fn with_notifier(
        config: ControllerConfig,
        fetcher: BoxedFetchAction<T>,
        store: BoxedQueryStore,
        notifier: BoxedNotifier,
    ) -> Result<Self> {
        config.check()?;

        let state = ControllerState {
            auth: AuthStatus::Loading,
            capabilities: Capabilities::none(),
            phase: ControllerPhase::Idle,
            result: PaginatedResult::empty(config.page_size),
            error: None,
            selection: SelectionTracker::new(),
            latest_token: 0,
            in_flight: None,
        };

        Ok(Self {
            resource: config.resource,
            fetcher,
            navigator: PageNavigator::new(store, notifier.clone(), &config),
            notifier,
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> MutexGuard<'_, ControllerState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the listed resource.
    #[inline]
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Returns the page navigator.
    #[inline]
    pub fn navigator(&self) -> &PageNavigator {
        &self.navigator
    }

    /// Returns the notification channel.
    #[inline]
    pub fn notifier(&self) -> &BoxedNotifier {
        &self.notifier
    }

    /// Marks the user as being resolved and discards any in-flight fetch.
    pub fn begin_auth(&self) {
        let mut state = self.state();
        state.auth = AuthStatus::Loading;
        state.capabilities = Capabilities::none();
        state.phase = ControllerPhase::Loading;
        state.invalidate();
    }

    /// Records the resolved user and projects its capabilities.
    ///
    /// Any in-flight fetch belonged to the previous user and is discarded.
    /// Call [`Self::refresh`] afterwards to load the page.
    pub fn resolve_auth(&self, user: Option<Actor>) {
        let capabilities = Capabilities::project(user.as_ref(), self.resource);
        let page_size = self.navigator.page_size();

        tracing::debug!(
            target: TRACING_TARGET_CONTROLLER,
            resource = %self.resource,
            user_id = user.as_ref().map(Actor::id),
            ?capabilities,
            "user resolved"
        );

        let mut state = self.state();
        state.auth = AuthStatus::Resolved(user);
        state.capabilities = capabilities;
        state.phase = ControllerPhase::Idle;
        state.invalidate();
        state.clear(page_size);
    }

    /// Returns the auth status.
    pub fn auth_status(&self) -> AuthStatus {
        self.state().auth.clone()
    }

    /// Returns the capability flags of the acting user.
    pub fn capabilities(&self) -> Capabilities {
        self.state().capabilities
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> ControllerPhase {
        self.state().phase
    }

    /// Discards the result of any in-flight fetch, e.g. when the screen
    /// goes away.
    pub fn invalidate(&self) {
        self.state().invalidate();
    }

    /// Loads the page the query store points at.
    pub async fn refresh(&self) -> LoadOutcome {
        self.load(self.navigator.query()).await
    }

    /// Loads `query`, coalescing with an identical load already in flight.
    pub async fn load(&self, query: Query) -> LoadOutcome {
        self.run_load(query, true).await
    }

    /// Loads `query` even if an identical load is in flight.
    ///
    /// Used after a mutation, where an earlier in-flight result may predate
    /// the change.
    pub async fn reload(&self, query: Query) -> LoadOutcome {
        self.run_load(query, false).await
    }

    async fn run_load(&self, query: Query, coalesce: bool) -> LoadOutcome {
        let token = match self.begin_load(&query, coalesce) {
            Ok(token) => token,
            Err(outcome) => return outcome,
        };

        tracing::debug!(
            target: TRACING_TARGET_CONTROLLER,
            resource = %self.resource,
            token,
            page = query.page,
            page_size = query.page_size,
            "fetch started"
        );

        let fetched = AssertUnwindSafe(self.fetcher.fetch(&query))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_error(panic)))
            .and_then(|result| result.validate().map(|()| result));

        self.settle(token, &query, fetched)
    }

    /// Performs the synchronous transitions before a fetch. Returns the
    /// token of the fetch to issue, or the outcome if none is issued.
    fn begin_load(&self, query: &Query, coalesce: bool) -> Result<u64, LoadOutcome> {
        let mut state = self.state();

        if state.auth == AuthStatus::Loading {
            state.phase = ControllerPhase::Loading;
            tracing::debug!(
                target: TRACING_TARGET_CONTROLLER,
                resource = %self.resource,
                "waiting for user before fetching"
            );
            return Err(LoadOutcome::AwaitingAuth);
        }

        if !state.capabilities.can_view {
            state.invalidate();
            state.clear(query.page_size);
            state.phase = ControllerPhase::Denied;
            drop(state);

            self.navigator.set_total_pages(0);
            tracing::info!(
                target: TRACING_TARGET_CONTROLLER,
                resource = %self.resource,
                "view denied, fetch skipped"
            );
            return Err(LoadOutcome::Denied);
        }

        if let Err(error) = query.check() {
            state.invalidate();
            state.clear(query.page_size.max(1));
            state.error = Some(error.clone());
            state.phase = ControllerPhase::Failed;
            drop(state);

            self.navigator.set_total_pages(0);
            self.notifier.notify(Notice::from_error(&error));
            return Err(LoadOutcome::Failed(error));
        }

        if coalesce
            && let Some(in_flight) = &state.in_flight
            && in_flight.query == *query
        {
            tracing::debug!(
                target: TRACING_TARGET_CONTROLLER,
                resource = %self.resource,
                token = in_flight.token,
                "identical fetch already in flight"
            );
            return Err(LoadOutcome::Coalesced);
        }

        state.latest_token += 1;
        let token = state.latest_token;
        state.in_flight = Some(InFlight {
            token,
            query: query.clone(),
        });
        state.phase = ControllerPhase::Loading;
        state.error = None;

        Ok(token)
    }

    /// Applies a fetch result, unless a newer fetch was issued meanwhile.
    fn settle(
        &self,
        token: u64,
        query: &Query,
        fetched: Result<PaginatedResult<T>>,
    ) -> LoadOutcome {
        let mut state = self.state();

        if state.latest_token != token {
            tracing::debug!(
                target: TRACING_TARGET_CONTROLLER,
                resource = %self.resource,
                token,
                latest = state.latest_token,
                "discarding stale fetch result"
            );
            return LoadOutcome::Stale;
        }

        state.in_flight = None;

        match fetched {
            Ok(result) => {
                let summary = PageSummary::of(&result);
                state.selection.reset(result.ids());
                state.result = result;
                state.error = None;
                state.phase = ControllerPhase::Ready;
                drop(state);

                self.navigator.set_total_pages(summary.total_pages);
                tracing::debug!(
                    target: TRACING_TARGET_CONTROLLER,
                    resource = %self.resource,
                    token,
                    page = summary.current_page,
                    total_pages = summary.total_pages,
                    total_count = summary.total_count,
                    "fetch settled"
                );

                LoadOutcome::Applied(summary)
            }
            Err(error) => {
                state.clear(query.page_size);
                state.error = Some(error.clone());
                state.phase = ControllerPhase::Failed;
                drop(state);

                self.navigator.set_total_pages(0);
                tracing::warn!(
                    target: TRACING_TARGET_CONTROLLER,
                    resource = %self.resource,
                    token,
                    kind = error.kind_str(),
                    code = error.code.as_deref(),
                    "fetch failed: {error}"
                );
                self.notifier.notify(Notice::from_error(&error));

                LoadOutcome::Failed(error)
            }
        }
    }

    /// Selects every row of the page, or clears the selection.
    pub fn select_all(&self, select: bool) {
        self.state().selection.select_all(select);
    }

    /// Selects or deselects one row of the page.
    pub fn select_one(&self, id: &EntityId, select: bool) -> bool {
        self.state().selection.select_one(id, select)
    }

    /// Clears the selection.
    pub fn clear_selection(&self) {
        self.state().selection.clear();
    }

    /// Returns the selected ids in page order.
    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.state().selection.selected_ids()
    }

    /// Returns the selection count and header checkbox value.
    pub fn selection(&self) -> SelectionSummary {
        self.state().selection.derived_state()
    }

    /// Captures the state for rendering.
    pub fn snapshot(&self) -> ControllerSnapshot<T> {
        let current_page = self.navigator.current_page();
        let jump_input = self.navigator.jump_input();
        let state = self.state();

        ControllerSnapshot {
            phase: state.phase,
            result: state.result.clone(),
            error: state.error.clone(),
            selection: state.selection.derived_state(),
            selected_ids: state.selection.selected_ids(),
            capabilities: state.capabilities,
            current_page,
            jump_input,
        }
    }
}

/// Converts a panic raised by a collaborator into an error.
pub(crate) fn panic_error(panic: Box<dyn Any + Send>) -> Error {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());

    Error::unexpected().with_message(detail)
}
