//! Pagination controller
//!
//! Owns page size, current page, the cached total count, and the cached pages for one
//! tenant and filter. The total is fetched when page 0 is loaded or when no count is
//! cached, and reused otherwise. Pages already loaded for the same tenant and filter are
//! served from the cache.
//!
//! Loads follow `idle -> loading -> {idle, error}`. While a load is in flight, further
//! page requests are ignored. Out-of-range navigation is ignored too. Ignored requests
//! return `Ok(None)`.

use crate::association::{AssociationLoader, LoadReport};
use crate::log_error;
use crate::progress::{Progress, ProgressSink, Stage};
use crate::state::{LoadTracker, LoadingGuard, Observable};
use crewboard_core::{
    models::{Person, PersonOverview},
    transform::transform_person,
    AppError, ErrorMetadata,
};
use crewboard_db::{parse_tenant_id, PeopleFilter, PersonRepository};
use crewboard_store::RemoteStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

pub const MAX_PAGE_SIZE: u32 = 500;

/// Pagination metadata published alongside each page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_size: u32,
    pub current_page: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub loaded_pages: BTreeSet<u32>,
}

impl PageInfo {
    pub fn compute(
        page_size: u32,
        current_page: u32,
        total_count: u64,
        loaded_pages: BTreeSet<u32>,
    ) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_count, page_size);
        Self {
            page_size,
            current_page,
            total_count,
            total_pages,
            has_next_page: current_page + 1 < total_pages,
            has_previous_page: current_page > 0,
            loaded_pages,
        }
    }

    pub fn empty(page_size: u32) -> Self {
        Self::compute(page_size, 0, 0, BTreeSet::new())
    }
}

/// `ceil(total_count / page_size)`
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One loaded page
#[derive(Debug, Clone)]
pub struct PageResult {
    pub people: Vec<PersonOverview>,
    pub info: PageInfo,
    pub report: LoadReport,
    pub from_cache: bool,
}

/// How a load interacts with one already in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Ignore the request
    Exclusive,
    /// Supersede the load in flight
    Supersede,
}

#[derive(Debug, Default)]
struct Cursor {
    tenant: Option<Uuid>,
    filter: PeopleFilter,
    current_page: u32,
    total_count: Option<u64>,
    pages: BTreeMap<u32, Vec<PersonOverview>>,
    /// Report of the last page fetched from the store
    report: LoadReport,
}

impl Cursor {
    fn matches(&self, tenant: Uuid, filter: &PeopleFilter) -> bool {
        self.tenant == Some(tenant) && self.filter == *filter
    }

    fn info(&self, page_size: u32) -> PageInfo {
        PageInfo::compute(
            page_size,
            self.current_page,
            self.total_count.unwrap_or(0),
            self.pages.keys().copied().collect(),
        )
    }

    /// Tenant, filter, and target page for navigation from the current page, if in range
    fn neighbour(&self, page_size: u32, target: impl FnOnce(u32) -> Option<u32>) -> Option<(Uuid, PeopleFilter, u32)> {
        let tenant = self.tenant?;
        let total = self.total_count?;
        let page = target(self.current_page)?;
        if page >= total_pages(total, page_size) {
            return None;
        }
        Some((tenant, self.filter.clone(), page))
    }
}

fn ignore_progress(_: Progress) {}

pub struct PaginationController {
    people: PersonRepository,
    loader: AssociationLoader,
    page_size: u32,
    cursor: Mutex<Cursor>,
    tracker: LoadTracker,
    page: Observable<Vec<PersonOverview>>,
    info: Observable<PageInfo>,
}

impl PaginationController {
    pub fn new(store: Arc<dyn RemoteStore>, page_size: u32) -> Self {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        Self {
            people: PersonRepository::new(store.clone()),
            loader: AssociationLoader::new(store),
            page_size,
            cursor: Mutex::new(Cursor::default()),
            tracker: LoadTracker::new(),
            page: Observable::new(Vec::new()),
            info: Observable::new(PageInfo::empty(page_size)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// People of the current page
    pub fn people(&self) -> &Observable<Vec<PersonOverview>> {
        &self.page
    }

    pub fn page_info(&self) -> &Observable<PageInfo> {
        &self.info
    }

    /// Loading flag and error slot of page loads
    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.is_loading()
    }

    pub fn info(&self) -> PageInfo {
        self.lock().info(self.page_size)
    }

    pub fn current_page(&self) -> u32 {
        self.lock().current_page
    }

    /// Cached total, if any
    pub fn total_count(&self) -> Option<u64> {
        self.lock().total_count
    }

    pub fn loaded_pages(&self) -> BTreeSet<u32> {
        self.lock().pages.keys().copied().collect()
    }

    pub fn cached_page(&self, page: u32) -> Option<Vec<PersonOverview>> {
        self.lock().pages.get(&page).cloned()
    }

    /// Filter in effect for `tenant`; the default filter for any other tenant
    pub(crate) fn filter_for(&self, tenant: Uuid) -> PeopleFilter {
        let cursor = self.lock();
        if cursor.tenant == Some(tenant) {
            cursor.filter.clone()
        } else {
            PeopleFilter::default()
        }
    }

    /// Current page of `tenant` as last committed, if the controller holds one
    pub(crate) fn committed_page(&self, tenant: Uuid) -> Option<PageResult> {
        let cursor = self.lock();
        if cursor.tenant != Some(tenant) {
            return None;
        }
        cursor.total_count?;
        let people = cursor.pages.get(&cursor.current_page)?.clone();
        Some(PageResult {
            people,
            info: cursor.info(self.page_size),
            report: cursor.report,
            from_cache: true,
        })
    }

    /// Load page `page` (0-based) of the people of `tenant_id`, newest first.
    ///
    /// Fails with `InvalidInput` before any I/O when `tenant_id` is blank or malformed.
    pub async fn load_page(
        &self,
        tenant_id: &str,
        page: u32,
        filter: &PeopleFilter,
    ) -> Result<Option<PageResult>, AppError> {
        let tenant = parse_tenant_id(tenant_id)?;
        self.load(tenant, page, filter.normalized(), &ignore_progress, Admission::Exclusive)
            .await
    }

    pub async fn next_page(&self) -> Result<Option<PageResult>, AppError> {
        let target = self
            .lock()
            .neighbour(self.page_size, |current| current.checked_add(1));
        self.load_target(target).await
    }

    pub async fn previous_page(&self) -> Result<Option<PageResult>, AppError> {
        let target = self
            .lock()
            .neighbour(self.page_size, |current| current.checked_sub(1));
        self.load_target(target).await
    }

    /// Jump to page `page`; ignored unless `page` is in `[0, total_pages)`
    pub async fn goto_page(&self, page: u32) -> Result<Option<PageResult>, AppError> {
        let target = self.lock().neighbour(self.page_size, |_| Some(page));
        self.load_target(target).await
    }

    async fn load_target(
        &self,
        target: Option<(Uuid, PeopleFilter, u32)>,
    ) -> Result<Option<PageResult>, AppError> {
        match target {
            Some((tenant, filter, page)) => {
                self.load(tenant, page, filter, &ignore_progress, Admission::Exclusive)
                    .await
            }
            None => {
                tracing::debug!("Ignoring page request outside the loaded range");
                Ok(None)
            }
        }
    }

    /// Search the current tenant's people.
    ///
    /// Clears the current page, cached pages, and the cached total before loading
    /// page 0 with the new term. Equality filters stay in effect. A blank term is the
    /// same as no search.
    pub async fn search(&self, term: &str) -> Result<Option<PageResult>, AppError> {
        let (tenant, filter) = {
            let mut cursor = self.lock();
            let tenant = cursor.tenant.ok_or_else(|| {
                AppError::InvalidInput("Load a tenant's people before searching".to_string())
            })?;
            let mut filter = cursor.filter.clone();
            filter.search = term.to_string();
            let filter = filter.normalized();
            *cursor = Cursor {
                tenant: Some(tenant),
                filter: filter.clone(),
                ..Cursor::default()
            };
            (tenant, filter)
        };

        self.tracker.invalidate();
        self.page.set(Vec::new());
        self.info.set(PageInfo::empty(self.page_size));

        self.load(tenant, 0, filter, &ignore_progress, Admission::Exclusive)
            .await
    }

    /// Clear cached pages and counters; any load in flight is superseded
    pub fn reset(&self) {
        self.tracker.invalidate();
        *self.lock() = Cursor::default();
        self.page.set(Vec::new());
        self.info.set(PageInfo::empty(self.page_size));
    }

    pub(crate) async fn load(
        &self,
        tenant: Uuid,
        page: u32,
        filter: PeopleFilter,
        progress: &dyn ProgressSink,
        admission: Admission,
    ) -> Result<Option<PageResult>, AppError> {
        let guard = match admission {
            Admission::Supersede => self.tracker.begin(),
            Admission::Exclusive => match self.tracker.try_begin() {
                Some(guard) => guard,
                None => {
                    tracing::debug!(page, "Page load already in progress, ignoring request");
                    return Ok(None);
                }
            },
        };

        let (cached_count, cached_page) = {
            let cursor = self.lock();
            if cursor.matches(tenant, &filter) {
                (cursor.total_count, cursor.pages.get(&page).cloned())
            } else {
                (None, None)
            }
        };

        let cached_count = cached_count.filter(|_| page != 0);
        if let (Some(total), Some(people)) = (cached_count, cached_page) {
            tracing::debug!(page, "Serving page from cache");
            return Ok(self.commit(guard, tenant, &filter, page, total, people, LoadReport::default(), true));
        }

        let total = match cached_count {
            Some(total) => total,
            None => {
                progress.report(Progress::at(Stage::PeopleCount, "Counting people"));
                match self.people.count(tenant, &filter).await {
                    Ok(total) => total,
                    Err(err) => return Err(self.fail(guard, "Failed to count people", err)),
                }
            }
        };

        let pages = total_pages(total, self.page_size);
        if page > 0 && page >= pages {
            tracing::debug!(page, total_pages = pages, "Requested page is out of range");
            guard.succeed();
            return Ok(None);
        }

        progress.report(Progress::at(
            Stage::PeopleData,
            format!("Loading page {} of {} ({} people)", page + 1, pages.max(1), total),
        ));
        let rows = if total == 0 {
            Vec::new()
        } else {
            let offset = u64::from(page) * u64::from(self.page_size);
            match self
                .people
                .page(tenant, &filter, offset, u64::from(self.page_size))
                .await
            {
                Ok(rows) => rows,
                Err(err) => return Err(self.fail(guard, "Failed to load people", err)),
            }
        };

        let people: Vec<Person> = rows.into_iter().map(transform_person).collect();
        let (composed, report) = match self.loader.load(tenant, people, progress).await {
            Ok(loaded) => loaded,
            Err(err) => return Err(self.fail(guard, "Failed to load related records", err)),
        };

        Ok(self.commit(guard, tenant, &filter, page, total, composed, report, false))
    }

    fn fail(&self, guard: LoadingGuard<'_>, context: &str, err: AppError) -> AppError {
        log_error(context, &err);
        guard.fail(err.client_message());
        err
    }

    #[allow(clippy::too_many_arguments)]
    fn commit(
        &self,
        guard: LoadingGuard<'_>,
        tenant: Uuid,
        filter: &PeopleFilter,
        page: u32,
        total: u64,
        people: Vec<PersonOverview>,
        report: LoadReport,
        from_cache: bool,
    ) -> Option<PageResult> {
        if !guard.is_current() {
            tracing::debug!(page, "Discarding page from superseded load");
            return None;
        }

        let info = {
            let mut cursor = self.lock();
            if !cursor.matches(tenant, filter) {
                *cursor = Cursor {
                    tenant: Some(tenant),
                    filter: filter.clone(),
                    ..Cursor::default()
                };
            }
            // Data first, derived counters after
            cursor.total_count = Some(total);
            cursor.pages.insert(page, people.clone());
            cursor.current_page = page;
            if !from_cache {
                cursor.report = report;
            }
            cursor.info(self.page_size)
        };

        guard.publish(&self.page, people.clone());
        guard.publish(&self.info, info.clone());
        guard.succeed();

        Some(PageResult {
            people,
            info,
            report,
            from_cache,
        })
    }
}
