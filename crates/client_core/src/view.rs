//! Catalog view controller: query state, draft, fetch cycle and mutations.
//!
//! Every list request takes a generation number when it is issued. A response is applied only
//! while its generation is still the newest one issued, so overlapping fetches can finish in any
//! order without the screen showing a page for an older query.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{BookId, SortKey, SortOrder},
    protocol::{Book, BookDraft, BookPatch, ListBooksQuery},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::CatalogError,
    transport::CatalogApi,
    types::{
        page_count, CatalogEvent, CatalogSnapshot, DeleteOutcome, DraftField, Notice,
        NoticeContext, QueryState, RefreshOutcome,
    },
};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this book?";
const MAX_NOTICES: usize = 32;

#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

pub struct AssumeYes;

#[async_trait]
impl ConfirmPrompt for AssumeYes {
    async fn confirm(&self, _message: &str) -> bool {
        true
    }
}

pub struct AssumeNo;

#[async_trait]
impl ConfirmPrompt for AssumeNo {
    async fn confirm(&self, _message: &str) -> bool {
        false
    }
}

struct ViewState {
    query: QueryState,
    draft: BookDraft,
    books: Vec<Book>,
    total: Option<u64>,
    issued_generation: u64,
    applied_generation: u64,
    refreshed_at: Option<chrono::DateTime<Utc>>,
    notices: VecDeque<Notice>,
}

impl ViewState {
    fn issue_request(&mut self) -> (u64, ListBooksQuery) {
        self.issued_generation += 1;
        (self.issued_generation, self.query.to_list_query())
    }

    fn page_count(&self) -> u64 {
        page_count(self.total, self.books.len(), self.query.page_size)
    }
}

/// Counts one outstanding list request until dropped, so an abandoned request is released too.
struct PendingRequest<'a>(&'a AtomicUsize);

impl<'a> PendingRequest<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct CatalogView {
    api: Arc<dyn CatalogApi>,
    inner: Mutex<ViewState>,
    in_flight: AtomicUsize,
    events: broadcast::Sender<CatalogEvent>,
}

impl CatalogView {
    pub fn new(api: Arc<dyn CatalogApi>) -> Arc<Self> {
        Self::with_query(api, QueryState::default())
    }

    /// Starts from `query`, falling back to defaults when it is not a valid query state.
    pub fn with_query(api: Arc<dyn CatalogApi>, query: QueryState) -> Arc<Self> {
        let query = match query.validate() {
            Ok(()) => query,
            Err(err) => {
                warn!("catalog: ignoring initial query state: {err}");
                QueryState::default()
            }
        };
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            inner: Mutex::new(ViewState {
                query,
                draft: BookDraft::default(),
                books: Vec::new(),
                total: None,
                issued_generation: 0,
                applied_generation: 0,
                refreshed_at: None,
                notices: VecDeque::new(),
            }),
            in_flight: AtomicUsize::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine; the snapshot still carries the state.
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.inner.lock().await;
        CatalogSnapshot {
            books: state.books.clone(),
            query: state.query,
            draft: state.draft.clone(),
            total: state.total,
            page_count: state.page_count(),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            generation: state.applied_generation,
            refreshed_at: state.refreshed_at,
        }
    }

    pub async fn books(&self) -> Vec<Book> {
        self.inner.lock().await.books.clone()
    }

    pub async fn query(&self) -> QueryState {
        self.inner.lock().await.query
    }

    pub async fn page_count(&self) -> u64 {
        self.inner.lock().await.page_count()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.inner.lock().await.notices.iter().cloned().collect()
    }

    pub async fn clear_notices(&self) {
        self.inner.lock().await.notices.clear();
    }

    async fn raise_notice(&self, context: NoticeContext, err: &CatalogError) {
        let notice = Notice::from_error(context, err);
        {
            let mut state = self.inner.lock().await;
            if state.notices.len() == MAX_NOTICES {
                state.notices.pop_front();
            }
            state.notices.push_back(notice.clone());
        }
        self.emit(CatalogEvent::Notice(notice));
    }

    /// Initial load when the view is first shown.
    pub async fn mount(&self) -> Result<RefreshOutcome, CatalogError> {
        info!("catalog: mounting view");
        self.refresh().await
    }

    /// Requests the page for the current query state and replaces the displayed books with it.
    pub async fn refresh(&self) -> Result<RefreshOutcome, CatalogError> {
        let (generation, query) = self.inner.lock().await.issue_request();
        self.run_list_request(generation, query).await
    }

    async fn run_list_request(
        &self,
        generation: u64,
        query: ListBooksQuery,
    ) -> Result<RefreshOutcome, CatalogError> {
        debug!(
            generation,
            page = query.page,
            limit = query.limit,
            sort_by = %query.sort_by,
            order = %query.order,
            "catalog: list request issued"
        );
        let pending = PendingRequest::start(&self.in_flight);
        let result = self.api.list_books(&query).await;
        drop(pending);

        let mut state = self.inner.lock().await;
        let is_current = generation == state.issued_generation;

        match result {
            Ok(response) if is_current => {
                state.books = response.books;
                state.total = response.total;
                state.applied_generation = generation;
                state.refreshed_at = Some(Utc::now());
                let books = state.books.clone();
                let page_count = state.page_count();
                drop(state);

                let count = books.len();
                debug!(generation, count, page_count, "catalog: page applied");
                self.emit(CatalogEvent::BooksReplaced {
                    generation,
                    books,
                    page_count,
                });
                Ok(RefreshOutcome::Applied { generation, count })
            }
            Ok(_) => {
                let latest = state.issued_generation;
                drop(state);
                debug!(generation, latest, "catalog: discarding superseded page");
                self.emit(CatalogEvent::StaleResponseDiscarded { generation });
                Ok(RefreshOutcome::Discarded { generation })
            }
            Err(err) => {
                drop(state);
                warn!(generation, "catalog: error fetching books: {err}");
                if is_current {
                    self.raise_notice(NoticeContext::Fetch, &err).await;
                }
                Err(err)
            }
        }
    }

    async fn change_query(
        &self,
        apply: impl FnOnce(&mut QueryState),
    ) -> Result<RefreshOutcome, CatalogError> {
        let (generation, query) = {
            let mut state = self.inner.lock().await;
            let mut next = state.query;
            apply(&mut next);
            next.validate()?;
            if next == state.query {
                return Ok(RefreshOutcome::Unchanged);
            }
            state.query = next;
            state.issue_request()
        };
        self.run_list_request(generation, query).await
    }

    pub async fn set_page(&self, page: u32) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|query| query.page = page).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|query| query.page_size = page_size).await
    }

    pub async fn set_sort_key(&self, sort_key: SortKey) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|query| query.sort_key = sort_key).await
    }

    pub async fn set_sort_order(
        &self,
        sort_order: SortOrder,
    ) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|query| query.sort_order = sort_order)
            .await
    }

    pub async fn toggle_sort_order(&self) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|query| query.sort_order = query.sort_order.flipped())
            .await
    }

    /// Replaces the whole query state with a single fetch.
    pub async fn set_query(&self, query: QueryState) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|current| *current = query).await
    }

    /// Moves one page forward. Bounded by the page count only when the server reports a total.
    pub async fn next_page(&self) -> Result<RefreshOutcome, CatalogError> {
        let last_page = {
            let state = self.inner.lock().await;
            state.total.map(|_| state.page_count().max(1))
        };
        self.change_query(|query| {
            let next = query.page.saturating_add(1);
            query.page = match last_page {
                Some(last) if u64::from(next) > last => query.page,
                _ => next,
            };
        })
        .await
    }

    pub async fn prev_page(&self) -> Result<RefreshOutcome, CatalogError> {
        self.change_query(|query| query.page = query.page.saturating_sub(1).max(1))
            .await
    }

    pub async fn draft(&self) -> BookDraft {
        self.inner.lock().await.draft.clone()
    }

    pub async fn update_draft(&self, edit: impl FnOnce(&mut BookDraft)) {
        edit(&mut self.inner.lock().await.draft);
    }

    pub async fn set_draft_field(&self, field: DraftField, value: &str) -> Result<(), CatalogError> {
        let mut state = self.inner.lock().await;
        field.apply(&mut state.draft, value)
    }

    pub async fn reset_draft(&self) {
        self.inner.lock().await.draft = BookDraft::default();
        self.emit(CatalogEvent::DraftReset);
    }

    /// Submits the draft. On success the draft is cleared and the current page re-fetched;
    /// on failure the draft is kept as it was. Edits made while the request is out are kept.
    pub async fn create_book(&self) -> Result<Option<Book>, CatalogError> {
        let draft = self.draft().await;
        match self.api.create_book(&draft).await {
            Ok(created) => {
                info!(
                    id = created.as_ref().map(|book| book.id.0),
                    title = %draft.title,
                    "catalog: book created"
                );
                let cleared = {
                    let mut state = self.inner.lock().await;
                    let unchanged = state.draft == draft;
                    if unchanged {
                        state.draft = BookDraft::default();
                    }
                    unchanged
                };
                if cleared {
                    self.emit(CatalogEvent::DraftReset);
                } else {
                    debug!("catalog: draft edited during create, keeping it");
                }
                if let Some(book) = &created {
                    self.emit(CatalogEvent::BookCreated(book.clone()));
                }
                let _ = self.refresh().await;
                Ok(created)
            }
            Err(err) => {
                warn!("catalog: error adding book: {err}");
                self.raise_notice(NoticeContext::Create, &err).await;
                Err(err)
            }
        }
    }

    /// Deletes a book after `prompt` confirms. Declining issues no request.
    pub async fn delete_book(
        &self,
        id: BookId,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<DeleteOutcome, CatalogError> {
        if !prompt.confirm(DELETE_CONFIRMATION).await {
            debug!(id = id.0, "catalog: delete declined");
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.api.delete_book(id).await {
            Ok(()) => {
                info!(id = id.0, "catalog: book deleted");
                self.emit(CatalogEvent::BookDeleted(id));
                let _ = self.refresh().await;
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!(id = id.0, "catalog: error deleting book: {err}");
                self.raise_notice(NoticeContext::Delete, &err).await;
                Err(err)
            }
        }
    }

    /// Applies a partial update, then re-fetches whether or not the update succeeded.
    pub async fn update_book(&self, id: BookId, patch: BookPatch) -> Result<(), CatalogError> {
        let result = self.api.update_book(id, &patch).await;
        match &result {
            Ok(()) => {
                info!(id = id.0, "catalog: book updated");
                self.emit(CatalogEvent::BookUpdated(id));
            }
            Err(err) => {
                warn!(id = id.0, "catalog: error updating book: {err}");
                self.raise_notice(NoticeContext::Update, err).await;
            }
        }
        let _ = self.refresh().await;
        result
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
