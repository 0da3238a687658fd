//! Single and batch mutations, followed by page reconciliation.
//!
//! After a successful mutation the same page is fetched again. When that
//! page turns out to lie past the end of the listing (its last record was
//! just removed), the coordinator steps back to the new last page and
//! fetches once more. A mutation shrinks the page count by at most what it
//! removed, so one step back always lands on a page that exists.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tabula_core::permission::Capability;
use tabula_core::{
    BoxedMutationAction, Entity, EntityId, Error, MutationKind, MutationReceipt, MutationRequest,
    Notice, Result,
};

use crate::controller::panic_error;
use crate::{EntityManagementController, LoadOutcome, TRACING_TARGET_MUTATION};

/// What a successful mutation led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Number of records the mutation applied to.
    pub affected: usize,
    /// Page shown after reconciliation.
    pub page: u32,
    /// Page that was left because it no longer existed, if any.
    pub corrected_from: Option<u32>,
    /// Whether the listing was refetched successfully.
    pub refreshed: bool,
}

/// Runs mutations on behalf of one listing screen.
pub struct MutationCoordinator<T> {
    controller: Arc<EntityManagementController<T>>,
    action: BoxedMutationAction,
}

impl<T> MutationCoordinator<T>
where
    T: Entity + Clone + Send + Sync + 'static,
{
    /// Creates a coordinator for the screen driven by `controller`.
    pub fn new(controller: Arc<EntityManagementController<T>>, action: BoxedMutationAction) -> Self {
        Self { controller, action }
    }

    /// Returns the controller this coordinator reconciles.
    #[inline]
    pub fn controller(&self) -> &Arc<EntityManagementController<T>> {
        &self.controller
    }

    /// Deletes one record.
    pub async fn delete_one(&self, id: EntityId) -> Result<MutationOutcome> {
        self.execute(MutationRequest::delete(vec![id])).await
    }

    /// Deletes a non-empty set of records.
    pub async fn delete_many(&self, ids: Vec<EntityId>) -> Result<MutationOutcome> {
        self.execute(MutationRequest::delete(ids)).await
    }

    /// Deletes the selected records.
    pub async fn delete_selected(&self) -> Result<MutationOutcome> {
        self.delete_many(self.controller.selected_ids()).await
    }

    /// Applies `changes` to one record.
    pub async fn update_one(
        &self,
        id: EntityId,
        changes: serde_json::Value,
    ) -> Result<MutationOutcome> {
        self.execute(MutationRequest::update(vec![id], changes)).await
    }

    /// Applies `changes` to a non-empty set of records.
    pub async fn update_many(
        &self,
        ids: Vec<EntityId>,
        changes: serde_json::Value,
    ) -> Result<MutationOutcome> {
        self.execute(MutationRequest::update(ids, changes)).await
    }

    async fn execute(&self, mut request: MutationRequest) -> Result<MutationOutcome> {
        let resource = self.controller.resource();
        let capability = match request.kind {
            MutationKind::Delete => Capability::Delete,
            MutationKind::Update { .. } => Capability::Edit,
        };

        if let Err(error) = self.controller.capabilities().require(resource, capability) {
            tracing::warn!(
                target: TRACING_TARGET_MUTATION,
                %resource,
                %capability,
                "mutation refused: capability not granted"
            );
            return Err(error);
        }

        let mut seen = HashSet::new();
        request.ids.retain(|id| seen.insert(id.clone()));

        if request.ids.is_empty() {
            let error = Error::validation().with_message("Select at least one record.");
            self.controller.notifier().notify(Notice::from_error(&error));
            return Err(error);
        }

        tracing::debug!(
            target: TRACING_TARGET_MUTATION,
            %resource,
            %capability,
            records = request.ids.len(),
            "mutation started"
        );

        let receipt = AssertUnwindSafe(self.action.mutate(request.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_error(panic)));

        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_MUTATION,
                    %resource,
                    kind = error.kind_str(),
                    code = error.code.as_deref(),
                    field = error.field.as_deref(),
                    "mutation failed: {error}"
                );
                self.controller.notifier().notify(Notice::from_error(&error));
                return Err(error);
            }
        };

        self.controller
            .notifier()
            .notify(Notice::success(success_message(&request.kind, receipt)));

        Ok(self.reconcile(receipt).await)
    }

    /// Refetches the current page and steps back once if it was emptied.
    async fn reconcile(&self, receipt: MutationReceipt) -> MutationOutcome {
        let navigator = self.controller.navigator();
        let query = navigator.query();

        self.controller.clear_selection();
        let first = self.controller.reload(query.clone()).await;

        let mut outcome = MutationOutcome {
            affected: receipt.affected,
            page: query.page,
            corrected_from: None,
            refreshed: matches!(first, LoadOutcome::Applied(_)),
        };

        if let Some(summary) = first.applied()
            && summary.is_past_end()
        {
            let target = navigator.go_to(summary.total_pages.max(1));

            tracing::info!(
                target: TRACING_TARGET_MUTATION,
                resource = %self.controller.resource(),
                from = summary.current_page,
                to = target,
                "page emptied by mutation, stepping back"
            );

            let second = self.controller.reload(query.with_page(target)).await;
            outcome.page = target;
            outcome.corrected_from = Some(summary.current_page);
            outcome.refreshed = matches!(second, LoadOutcome::Applied(_));
        }

        self.controller.clear_selection();
        outcome
    }
}

fn success_message(kind: &MutationKind, receipt: MutationReceipt) -> String {
    let verb = match kind {
        MutationKind::Delete => "deleted",
        MutationKind::Update { .. } => "updated",
    };

    match receipt.affected {
        1 => format!("1 record {verb}"),
        n => format!("{n} records {verb}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabula_core::permission::{Resource, Role};
    use tabula_core::{ErrorKind, NoticeLevel, PaginatedResult};
    use tabula_test::{
        MockDataset, MockFetchAction, MockMutationAction, RecordingNotifier, Subnet, actor,
        subnets,
    };

    use super::*;
    use crate::{ControllerConfig, ControllerPhase, QueryStore, Tristate, UrlQueryStore};

    struct Fixture {
        coordinator: MutationCoordinator<Subnet>,
        fetcher: Arc<MockFetchAction<Subnet>>,
        action: Arc<MockMutationAction<Subnet>>,
        data: MockDataset<Subnet>,
        store: Arc<UrlQueryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn controller(&self) -> &EntityManagementController<Subnet> {
            self.coordinator.controller()
        }
    }

    async fn fixture(records: usize, page: u32, role: Role) -> Fixture {
        let data = MockDataset::new(subnets(records));
        let fetcher = Arc::new(MockFetchAction::new(data.clone()));
        let action = Arc::new(MockMutationAction::new(data.clone()));
        let store = Arc::new(
            UrlQueryStore::parse(&format!("https://admin.local/subnets?site=ams&page={page}"))
                .unwrap(),
        );
        let notifier = Arc::new(RecordingNotifier::new());

        let controller = EntityManagementController::<Subnet>::with_notifier(
            ControllerConfig::for_resource(Resource::Subnet),
            fetcher.clone(),
            store.clone(),
            notifier.clone(),
        )
        .unwrap();
        controller.resolve_auth(Some(actor(role)));
        controller.refresh().await;

        Fixture {
            coordinator: MutationCoordinator::new(Arc::new(controller), action.clone()),
            fetcher,
            action,
            data,
            store,
            notifier,
        }
    }

    fn page_ids(f: &Fixture) -> Vec<EntityId> {
        f.controller().snapshot().result.ids()
    }

    #[tokio::test]
    async fn test_deleting_last_item_of_last_page_steps_back() {
        let f = fixture(21, 3, Role::Operator).await;
        assert_eq!(f.controller().snapshot().result.len(), 1);

        let sole = page_ids(&f)[0].clone();
        f.controller().select_one(&sole, true);

        let outcome = f.coordinator.delete_one(sole).await.unwrap();

        assert_eq!(outcome.page, 2);
        assert_eq!(outcome.corrected_from, Some(3));
        assert!(outcome.refreshed);
        assert_eq!(f.controller().navigator().current_page(), 2);
        assert_eq!(f.store.get("page").as_deref(), Some("2"));
        assert_eq!(f.store.get("site").as_deref(), Some("ams"));

        let snapshot = f.controller().snapshot();
        assert_eq!(snapshot.result.current_page, 2);
        assert_eq!(snapshot.result.total_pages, 2);
        assert_eq!(snapshot.result.len(), 10);
        assert!(snapshot.selected_ids.is_empty());

        // Initial load, same-page refetch, corrected refetch.
        assert_eq!(f.fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_deleting_on_first_page_stays_put() {
        let f = fixture(25, 1, Role::Operator).await;
        let victim = page_ids(&f)[4].clone();

        let outcome = f.coordinator.delete_one(victim.clone()).await.unwrap();

        assert_eq!(outcome.page, 1);
        assert_eq!(outcome.corrected_from, None);
        assert_eq!(f.controller().navigator().current_page(), 1);
        assert_eq!(f.fetcher.calls(), 2);
        assert!(!page_ids(&f).contains(&victim));
        assert_eq!(f.controller().snapshot().result.total_count, 24);
    }

    #[tokio::test]
    async fn test_deleting_the_only_record_shows_empty_state() {
        let f = fixture(1, 1, Role::Operator).await;
        let sole = page_ids(&f)[0].clone();

        let outcome = f.coordinator.delete_one(sole).await.unwrap();

        assert_eq!(outcome.page, 1);
        assert_eq!(outcome.corrected_from, None);
        assert_eq!(f.fetcher.calls(), 2);

        let snapshot = f.controller().snapshot();
        assert_eq!(
            snapshot.result,
            PaginatedResult {
                data: Vec::new(),
                total_count: 0,
                current_page: 1,
                total_pages: 0,
                page_size: 10,
            }
        );
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.current_page, 1);
    }

    #[tokio::test]
    async fn test_batch_delete_of_whole_last_page() {
        let f = fixture(23, 3, Role::Operator).await;
        f.controller().select_all(Tristate::Checked.into_command());
        assert_eq!(f.controller().selection().count, 3);

        let outcome = f.coordinator.delete_selected().await.unwrap();

        assert_eq!(outcome.affected, 3);
        assert_eq!(outcome.page, 2);
        assert_eq!(outcome.corrected_from, Some(3));
        assert!(f.controller().selection().is_empty());
        assert_eq!(f.data.len(), 20);

        let notices = f.notifier.notices();
        assert_eq!(notices.last().unwrap().level, NoticeLevel::Success);
        assert_eq!(notices.last().unwrap().message, "3 records deleted");
    }

    #[tokio::test]
    async fn test_partial_delete_on_middle_page_clears_selection() {
        let f = fixture(30, 2, Role::Operator).await;
        let ids = page_ids(&f);
        f.controller().select_one(&ids[0], true);
        f.controller().select_one(&ids[1], true);

        let outcome = f.coordinator.delete_selected().await.unwrap();

        assert_eq!(outcome.page, 2);
        assert_eq!(outcome.corrected_from, None);
        assert_eq!(f.controller().selection().header, Tristate::Unchecked);
        assert_eq!(f.controller().snapshot().result.total_pages, 3);
    }

    #[tokio::test]
    async fn test_delete_without_capability_never_calls_action() {
        let f = fixture(5, 1, Role::Viewer).await;
        let id = page_ids(&f)[0].clone();

        assert!(!f.controller().snapshot().show_batch_delete());

        let error = f.coordinator.delete_one(id.clone()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AuthorizationDenied);

        let error = f.coordinator.delete_many(vec![id]).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AuthorizationDenied);

        assert_eq!(f.action.calls(), 0);
        assert_eq!(f.data.len(), 5);
        assert!(f.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_refused() {
        let f = fixture(5, 1, Role::Operator).await;

        let error = f.coordinator.delete_many(Vec::new()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(f.action.calls(), 0);
        assert_eq!(f.notifier.notices()[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_state() {
        let f = fixture(12, 1, Role::Operator).await;
        let id = page_ids(&f)[0].clone();
        f.controller().select_one(&id, true);
        f.action.fail_next(
            Error::remote_failure()
                .with_code("IN_USE")
                .with_field("vlan")
                .with_message("Subnet still has addresses assigned"),
        );

        let error = f.coordinator.delete_one(id.clone()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::RemoteFailure);
        assert_eq!(f.action.calls(), 1);
        assert_eq!(f.fetcher.calls(), 1);
        assert_eq!(f.controller().selected_ids(), vec![id]);
        assert_eq!(f.controller().phase(), ControllerPhase::Ready);

        let notices = f.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Subnet still has addresses assigned");
        assert_eq!(notices[0].field.as_deref(), Some("vlan"));
    }

    #[tokio::test]
    async fn test_panicking_action_is_caught() {
        let f = fixture(3, 1, Role::Operator).await;
        let id = page_ids(&f)[0].clone();
        f.action.panic_next();

        let error = f.coordinator.delete_one(id).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnexpectedClient);
        assert_eq!(
            f.notifier.notices()[0].message,
            "Something went wrong. Please try again."
        );
    }

    #[tokio::test]
    async fn test_update_requires_edit() {
        let f = fixture(3, 1, Role::Auditor).await;
        let id = page_ids(&f)[0].clone();

        let error = f
            .coordinator
            .update_one(id, json!({"status": "reserved"}))
            .await
            .unwrap_err();

        assert!(error.is_authorization_denied());
        assert_eq!(f.action.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_refreshes_page() {
        let f = fixture(3, 1, Role::Operator).await;
        let ids = page_ids(&f);

        let outcome = f
            .coordinator
            .update_many(ids.clone(), json!({"status": "reserved"}))
            .await
            .unwrap();

        assert_eq!(outcome.affected, 3);
        assert_eq!(outcome.corrected_from, None);
        let snapshot = f.controller().snapshot();
        assert!(snapshot.result.data.iter().all(|s| s.status == "reserved"));
        assert_eq!(f.notifier.notices()[0].message, "3 records updated");
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_submitted_once() {
        let f = fixture(5, 1, Role::Operator).await;
        let id = page_ids(&f)[0].clone();

        f.coordinator
            .delete_many(vec![id.clone(), id.clone()])
            .await
            .unwrap();

        assert_eq!(f.action.requests()[0].ids, vec![id]);
    }

    #[test]
    fn test_success_messages() {
        let one = MutationReceipt { affected: 1 };
        let many = MutationReceipt { affected: 4 };
        assert_eq!(success_message(&MutationKind::Delete, one), "1 record deleted");
        assert_eq!(success_message(&MutationKind::Delete, many), "4 records deleted");
    }
}
