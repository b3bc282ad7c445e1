//! Progress-reporting dashboard load
//!
//! Loads everything the dashboard shows for one tenant as a strictly ordered sequence of
//! [`Stage`]s. Each stage publishes its progress before starting work, and later stages
//! consume ids produced by earlier ones, so nothing runs concurrently across stages.
//!
//! A failing stage stops the sequence, records a readable message in the error slot, and
//! leaves whatever earlier stages published in place. A load superseded by a newer one
//! stops publishing as soon as it notices. A people search or reset that lands while the
//! people stage runs replaces only that stage's page: the load carries on with the
//! search's page, or fetches the first page again after a reset.

use crate::association::LoadReport;
use crate::log_error;
use crate::pagination::{Admission, PaginationController};
use crate::progress::{Progress, Stage};
use crate::state::{DashboardState, LoadingGuard};
use crewboard_core::{
    models::{Application, Client, Invitation},
    transform::{transform_application, transform_client, transform_invitation},
    AppError, ErrorMetadata,
};
use crewboard_db::{ApplicationRepository, ClientRepository, InvitationRepository};
use crewboard_store::RemoteStore;
use serde::Serialize;
use std::sync::Arc;

/// Times the people page is requested before a load gives up on a page that keeps being replaced
const MAX_PAGE_ATTEMPTS: u32 = 3;

/// What a completed dashboard load produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub client: Client,
    pub applications: usize,
    pub total_people: u64,
    pub people_loaded: usize,
    pub invitations: usize,
    pub report: LoadReport,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Completed(LoadSummary),
    /// A newer dashboard load started before this one finished; nothing further was published.
    /// Searching or resetting the people page does not supersede a dashboard load.
    Superseded,
}

pub struct DashboardLoader {
    clients: ClientRepository,
    applications: ApplicationRepository,
    invitations: InvitationRepository,
    pagination: PaginationController,
    state: DashboardState,
}

impl DashboardLoader {
    pub fn new(store: Arc<dyn RemoteStore>, page_size: u32) -> Self {
        Self {
            clients: ClientRepository::new(store.clone()),
            applications: ApplicationRepository::new(store.clone()),
            invitations: InvitationRepository::new(store.clone()),
            pagination: PaginationController::new(store, page_size),
            state: DashboardState::new(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    /// Drop all tenant data; used when switching tenants
    pub fn reset(&self) {
        self.state.reset();
        self.pagination.reset();
    }

    fn advance(&self, guard: &LoadingGuard<'_>, progress: Progress) {
        tracing::info!(
            stage = %progress.stage,
            current = progress.current,
            total = progress.total,
            "{}",
            progress.message
        );
        guard.publish(&self.state.progress, progress);
    }

    fn fail(&self, guard: LoadingGuard<'_>, err: AppError) -> AppError {
        let stage = self.state.progress.get().stage;
        log_error(&format!("Dashboard load failed at stage {}", stage), &err);
        guard.fail(format!("{} failed: {}", stage.label(), err.client_message()));
        err
    }

    /// Load client, applications, the first page of people with their relations, and
    /// invitations for the tenant `selector` resolves to.
    ///
    /// `selector` is an opaque client id or code; unresolvable selectors fall back to a
    /// demo tenant. Publishes `Complete` on success, including for a tenant with no people.
    #[tracing::instrument(skip(self))]
    pub async fn load_client_data(&self, selector: &str) -> Result<LoadOutcome, AppError> {
        let guard = self.state.load.begin();

        self.advance(
            &guard,
            Progress::at(Stage::Client, format!("Resolving client {:?}", selector)),
        );
        let client = match self.clients.resolve(selector).await {
            Ok(row) => transform_client(row),
            Err(err) => return Err(self.fail(guard, err)),
        };
        if !guard.is_current() {
            return Ok(LoadOutcome::Superseded);
        }
        let switching = self
            .state
            .client
            .get()
            .map(|current| current.id != client.id)
            .unwrap_or(true);
        if switching {
            tracing::info!(client_code = %client.code, "Switching tenant");
            self.state.applications.set(Vec::new());
            self.state.invitations.set(Vec::new());
            self.pagination.reset();
        }
        guard.publish(&self.state.client, Some(client.clone()));

        self.advance(
            &guard,
            Progress::at(Stage::Applications, format!("Loading applications for {}", client.code)),
        );
        let applications: Vec<Application> = match self.applications.list_for_client(client.id).await {
            Ok(rows) => rows.into_iter().map(transform_application).collect(),
            Err(err) => return Err(self.fail(guard, err)),
        };
        if !guard.publish(&self.state.applications, applications.clone()) {
            return Ok(LoadOutcome::Superseded);
        }

        let mut attempts = 0;
        let page = loop {
            attempts += 1;
            let filter = self.pagination.filter_for(client.id);
            let forward = |progress: Progress| self.advance(&guard, progress);
            match self
                .pagination
                .load(client.id, 0, filter, &forward, Admission::Supersede)
                .await
            {
                Ok(Some(page)) => break page,
                Ok(None) => {}
                Err(err) => return Err(self.fail(guard, err)),
            }
            if !guard.is_current() {
                return Ok(LoadOutcome::Superseded);
            }

            // A search or reset replaced the people page; adopt its result once it settles
            self.pagination.tracker().settled().await;
            if !guard.is_current() {
                return Ok(LoadOutcome::Superseded);
            }
            if let Some(page) = self.pagination.committed_page(client.id) {
                tracing::debug!(client_code = %client.code, "Using people page committed by a search");
                break page;
            }
            if attempts >= MAX_PAGE_ATTEMPTS {
                return Err(self.fail(
                    guard,
                    AppError::Internal("People page kept being replaced while loading".into()),
                ));
            }
        };

        self.advance(
            &guard,
            Progress::at(Stage::Invitations, format!("Loading invitations for {}", client.code)),
        );
        let invitations: Vec<Invitation> = match self.invitations.list_for_client(client.id).await {
            Ok(rows) => rows.into_iter().map(transform_invitation).collect(),
            Err(err) => return Err(self.fail(guard, err)),
        };
        if !guard.publish(&self.state.invitations, invitations.clone()) {
            return Ok(LoadOutcome::Superseded);
        }

        self.advance(
            &guard,
            Progress::at(
                Stage::Complete,
                format!(
                    "Loaded {} of {} people for {}",
                    page.people.len(),
                    page.info.total_count,
                    client.code
                ),
            ),
        );
        guard.succeed();

        Ok(LoadOutcome::Completed(LoadSummary {
            client,
            applications: applications.len(),
            total_people: page.info.total_count,
            people_loaded: page.people.len(),
            invitations: invitations.len(),
            report: page.report,
        }))
    }
}
