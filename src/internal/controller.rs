//! List-view state and query coordination.
//!
//! `QueryController` owns filter and pagination state, derives the canonical
//! [`Query`] and hands out generation-tagged [`FetchTicket`]s. The caller runs
//! the ticket (see [`load_list`]) and feeds the result back through
//! [`QueryController::apply_fetch`]; only the most recently issued generation
//! is ever applied, whatever order the responses arrive in.

use crate::api::{ApiError, ApiService};
use crate::internal::collection::{
    CollectionKind, CollectionOutcome, CollectionResolution, CollectionRunState,
    CollectionWorkflow, TriggerDecision,
};
use crate::internal::models::{ArticleSummary, Stats};
use crate::internal::query::{FilterState, FilterUpdate, PaginationState, Query};

/// One fetch cycle to run: the query plus the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: Query,
}

/// Everything one fetch cycle produces. Applied as a unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListSnapshot {
    pub articles: Vec<ArticleSummary>,
    pub total_pages: u32,
    pub categories: Vec<String>,
    pub sources: Vec<String>,
    pub stats: Stats,
}

/// Run the four list requests concurrently. Any failure fails the cycle.
#[tracing::instrument(skip(api, query), fields(query = %query))]
pub async fn load_list(api: &ApiService, query: &Query) -> Result<ListSnapshot, ApiError> {
    let (page, categories, sources, stats) = futures::try_join!(
        api.list_articles(query),
        api.list_categories(),
        api.list_sources(),
        api.get_stats(),
    )?;

    Ok(ListSnapshot {
        articles: page.articles,
        total_pages: page.total_pages.max(1),
        categories,
        sources,
        stats,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchApplied {
    /// Latest generation, data replaced.
    Applied,
    /// Data replaced, but the page fell past the new last page. The page was
    /// moved to the last one and this ticket refetches it.
    Clamped(FetchTicket),
    /// Latest generation, request failed; previous data kept and banner set.
    Failed,
    /// Superseded by a newer ticket; ignored.
    Stale,
}

#[derive(Debug, Default)]
pub struct QueryController {
    filters: FilterState,
    pagination: PaginationState,
    generation: u64,
    last_issued: Option<Query>,
    loading: bool,
    snapshot: ListSnapshot,
    has_loaded: bool,
    banner: Option<String>,
    collection: CollectionWorkflow,
}

impl QueryController {
    pub fn new() -> Self {
        Self::default()
    }

    /// First fetch cycle after the list view is shown.
    pub fn mount(&mut self) -> FetchTicket {
        self.issue(self.current_query())
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn snapshot(&self) -> &ListSnapshot {
        &self.snapshot
    }

    pub fn articles(&self) -> &[ArticleSummary] {
        &self.snapshot.articles
    }

    /// True once a cycle has succeeded; an empty page before that means "loading".
    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_query(&self) -> Query {
        Query::derive(&self.filters, &self.pagination)
    }

    pub fn set_filter(&mut self, update: FilterUpdate) -> Option<FetchTicket> {
        tracing::debug!(field = %update.field(), "set_filter");
        self.filters.apply(update);
        self.pagination.page = 1;
        self.reevaluate()
    }

    /// Edit the search box. Never triggers a fetch.
    pub fn set_keyword_draft(&mut self, draft: impl Into<String>) {
        self.filters.keyword_draft = draft.into();
    }

    /// Commit the draft keyword. No-op when it matches the committed one.
    pub fn submit_search(&mut self) -> Option<FetchTicket> {
        if !self.filters.commit_keyword() {
            return None;
        }
        self.pagination.page = 1;
        self.reevaluate()
    }

    pub fn clear_filters(&mut self) -> Option<FetchTicket> {
        self.filters = FilterState::default();
        self.pagination.page = 1;
        self.reevaluate()
    }

    /// Jump to `page`. Pages outside `1..=total_pages` are ignored.
    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        if !self.pagination.contains(page) {
            tracing::debug!(
                page,
                total_pages = self.pagination.total_pages,
                "ignoring out-of-range page"
            );
            return None;
        }
        self.pagination.page = page;
        self.reevaluate()
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        self.set_page(self.pagination.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        self.set_page(self.pagination.page.saturating_sub(1))
    }

    /// Re-run the current query without touching any state.
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue(self.current_query())
    }

    /// Apply a finished cycle. Only the latest generation lands.
    pub fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<ListSnapshot, ApiError>,
    ) -> FetchApplied {
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "dropping stale fetch");
            return FetchApplied::Stale;
        }

        self.loading = false;
        match result {
            Ok(snapshot) => {
                tracing::info!(
                    generation,
                    articles = snapshot.articles.len(),
                    total_pages = snapshot.total_pages,
                    "list loaded"
                );
                self.pagination.total_pages = snapshot.total_pages.max(1);
                self.snapshot = snapshot;
                self.has_loaded = true;
                self.banner = None;
                if self.pagination.page > self.pagination.total_pages {
                    tracing::info!(
                        page = self.pagination.page,
                        total_pages = self.pagination.total_pages,
                        "page past the end, moving to last page"
                    );
                    self.pagination.page = self.pagination.total_pages;
                    if let Some(ticket) = self.reevaluate() {
                        return FetchApplied::Clamped(ticket);
                    }
                }
                FetchApplied::Applied
            }
            Err(err) => {
                tracing::error!(generation, error = %err, "list fetch failed");
                self.banner = Some(format!("Failed to load articles: {}", err));
                FetchApplied::Failed
            }
        }
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn collection_state(&self) -> CollectionRunState {
        self.collection.run_state()
    }

    pub fn collection_controls_enabled(&self) -> bool {
        self.collection.controls_enabled()
    }

    pub fn pending_confirmation(&self) -> Option<CollectionKind> {
        self.collection.pending_confirmation()
    }

    pub fn request_collection(&mut self, kind: CollectionKind) -> TriggerDecision {
        self.collection.request(kind)
    }

    pub fn confirm_collection(&mut self) -> Option<CollectionKind> {
        self.collection.confirm()
    }

    pub fn decline_collection(&mut self) -> Option<CollectionKind> {
        self.collection.decline()
    }

    /// Resolve a finished job. On success a refresh ticket comes back too.
    pub fn complete_collection(
        &mut self,
        kind: CollectionKind,
        result: Result<CollectionOutcome, ApiError>,
    ) -> (CollectionResolution, Option<FetchTicket>) {
        let resolution = self.collection.finish(kind, result);
        let ticket = resolution.refresh.then(|| self.refresh());
        (resolution, ticket)
    }

    fn reevaluate(&mut self) -> Option<FetchTicket> {
        let query = self.current_query();
        if self.last_issued.as_ref() == Some(&query) {
            return None;
        }
        Some(self.issue(query))
    }

    fn issue(&mut self, query: Query) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        self.last_issued = Some(query.clone());
        tracing::debug!(generation = self.generation, query = %query, "issuing fetch");
        FetchTicket {
            generation: self.generation,
            query,
        }
    }
}
