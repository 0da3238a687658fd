//! Scripted listing session.
//!
//! A session owns one listing screen: the controller, its mutation
//! coordinator and the URL the screen is bound to. Commands act on the
//! screen; whenever one changes the URL the page is fetched again, the way a
//! browser would re-render on navigation.

mod command;
mod render;

use std::sync::Arc;

use anyhow::Context;
pub use command::Command;
use tabula_client::{EntityManagementController, LoadOutcome, MutationCoordinator, UrlQueryStore};
use tabula_core::EntityId;
use tabula_core::permission::Role;
use tabula_test::{MockDataset, MockFetchAction, MockMutationAction, Subnet, actor, subnets};
use tokio::sync::watch;
use url::Url;

use crate::TRACING_TARGET_SESSION;
use crate::config::Cli;

/// One listing screen driven by script commands.
pub struct Session {
    controller: Arc<EntityManagementController<Subnet>>,
    coordinator: MutationCoordinator<Subnet>,
    store: Arc<UrlQueryStore>,
    changes: watch::Receiver<Url>,
}

impl Session {
    /// Builds the screen and its mock backend from the configuration.
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let data = MockDataset::new(subnets(cli.session.records));
        let fetcher = Arc::new(MockFetchAction::with_config(data.clone(), &cli.mock));
        let action = Arc::new(MockMutationAction::with_config(data, &cli.mock));

        let store = Arc::new(
            UrlQueryStore::parse(&cli.session.url).context("invalid listing URL")?,
        );
        let changes = store.subscribe();

        let controller = EntityManagementController::<Subnet>::new(
            cli.controller.clone(),
            fetcher,
            store.clone(),
        )
        .context("invalid controller configuration")?;
        let controller = Arc::new(controller);

        Ok(Self {
            coordinator: MutationCoordinator::new(controller.clone(), action),
            controller,
            store,
            changes,
        })
    }

    /// Resolves the configured user and loads the first page.
    pub async fn start(&mut self, role: Option<Role>) {
        self.controller.begin_auth();
        self.controller.resolve_auth(role.map(actor));
        let outcome = self.controller.refresh().await;
        self.log_outcome(&outcome);
        self.mark_seen();
    }

    /// Runs one command and renders the screen.
    pub async fn execute(&mut self, command: Command) {
        tracing::debug!(target: TRACING_TARGET_SESSION, ?command, "executing");

        let controller = Arc::clone(&self.controller);
        let navigator = controller.navigator();
        match command {
            Command::List => {}
            Command::Refresh => {
                let outcome = controller.reload(navigator.query()).await;
                self.log_outcome(&outcome);
            }
            Command::Page(page) => {
                navigator.go_to(page);
            }
            Command::Jump(raw) => {
                navigator.set_jump_input(raw.as_str());
                // Rejections are already surfaced through the notifier.
                let _ = navigator.jump_to_page(&raw);
            }
            Command::Next => {
                navigator.go_to(navigator.current_page().saturating_add(1));
            }
            Command::Prev => {
                navigator.go_to(navigator.current_page().saturating_sub(1));
            }
            Command::Select(id) => self.select(&id, true),
            Command::Deselect(id) => self.select(&id, false),
            Command::SelectAll => self.controller.select_all(true),
            Command::SelectNone => self.controller.select_all(false),
            Command::Delete(ids) => {
                render::print_refusal(&self.coordinator.delete_many(ids).await);
                self.mark_seen();
            }
            Command::DeleteSelected => {
                render::print_refusal(&self.coordinator.delete_selected().await);
                self.mark_seen();
            }
            Command::Update { ids, changes } => {
                render::print_refusal(&self.coordinator.update_many(ids, changes).await);
                self.mark_seen();
            }
            Command::Filter(key, value) => navigator.set_filter(&key, &value),
            Command::Unfilter(key) => navigator.clear_filter(&key),
            Command::SignIn(role) => {
                self.start(Some(role)).await;
            }
            Command::SignOut => {
                self.start(None).await;
            }
        }

        self.follow_url().await;
        render::print(&self.controller.snapshot(), self.store.url().as_str());
    }

    fn select(&self, id: &EntityId, select: bool) {
        if !self.controller.select_one(id, select) {
            println!("! {id} is not on this page");
        }
    }

    /// Refetches if a command changed the URL.
    async fn follow_url(&mut self) {
        if !self.changes.has_changed().unwrap_or(false) {
            return;
        }

        self.mark_seen();
        let outcome = self.controller.refresh().await;
        self.log_outcome(&outcome);
    }

    fn mark_seen(&mut self) {
        self.changes.borrow_and_update();
    }

    fn log_outcome(&self, outcome: &LoadOutcome) {
        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            page = self.controller.navigator().current_page(),
            ?outcome,
            "load settled"
        );
    }
}
