use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use shared::{
    domain::{BookId, SortKey, SortOrder},
    protocol::{Book, BookDraft, ListBooksQuery},
};

use crate::error::CatalogError;

pub const DEFAULT_PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryState {
    pub page: u32,
    pub page_size: u32,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_key: SortKey::Id,
            sort_order: SortOrder::Asc,
        }
    }
}

impl QueryState {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.page == 0 {
            return Err(CatalogError::InvalidQuery("page must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(CatalogError::InvalidQuery(
                "page size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn to_list_query(&self) -> ListBooksQuery {
        ListBooksQuery {
            page: self.page,
            limit: self.page_size,
            sort_by: self.sort_key,
            order: self.sort_order,
        }
    }
}

/// Number of pages for the pagination control.
///
/// A server-reported total wins; without one the count is derived from the page on screen.
pub fn page_count(total: Option<u64>, displayed: usize, page_size: u32) -> u64 {
    let items = total.unwrap_or(displayed as u64);
    items.div_ceil(u64::from(page_size.max(1)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Author,
    Title,
    Year,
    Genre,
    Pages,
    Available,
}

impl FromStr for DraftField {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "author" => Ok(DraftField::Author),
            "title" => Ok(DraftField::Title),
            "year" => Ok(DraftField::Year),
            "genre" => Ok(DraftField::Genre),
            "pages" => Ok(DraftField::Pages),
            "available" => Ok(DraftField::Available),
            other => Err(CatalogError::InvalidInput(format!(
                "unknown draft field '{other}'"
            ))),
        }
    }
}

pub fn parse_availability(raw: &str) -> Result<bool, CatalogError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "available" => Ok(true),
        "false" | "no" | "n" | "unavailable" | "not available" => Ok(false),
        other => Err(CatalogError::InvalidInput(format!(
            "'{other}' is not an availability value"
        ))),
    }
}

impl DraftField {
    /// Writes raw form input into the draft. Text is stored as entered.
    pub fn apply(self, draft: &mut BookDraft, value: &str) -> Result<(), CatalogError> {
        match self {
            DraftField::Author => draft.author = value.to_string(),
            DraftField::Title => draft.title = value.to_string(),
            DraftField::Year => draft.year = value.to_string(),
            DraftField::Genre => draft.genre = value.to_string(),
            DraftField::Pages => draft.pages = value.to_string(),
            DraftField::Available => draft.available = parse_availability(value)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeContext {
    Fetch,
    Create,
    Delete,
    Update,
}

impl fmt::Display for NoticeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeContext::Fetch => "loading books",
            NoticeContext::Create => "adding book",
            NoticeContext::Delete => "deleting book",
            NoticeContext::Update => "updating book",
        };
        f.write_str(label)
    }
}

/// User-facing record of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub context: NoticeContext,
    pub message: String,
    pub transient: bool,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn from_error(context: NoticeContext, err: &CatalogError) -> Self {
        Self {
            context,
            message: err.to_string(),
            transient: err.is_transient(),
            raised_at: Utc::now(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}: {}", self.context, self.message)?;
        if self.transient {
            f.write_str(" (temporary, try again)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    BooksReplaced {
        generation: u64,
        books: Vec<Book>,
        page_count: u64,
    },
    StaleResponseDiscarded {
        generation: u64,
    },
    DraftReset,
    BookCreated(Book),
    BookDeleted(BookId),
    BookUpdated(BookId),
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Query state already matched; no request issued.
    Unchanged,
    Applied { generation: u64, count: usize },
    /// A newer request was issued while this one was in flight.
    Discarded { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub books: Vec<Book>,
    pub query: QueryState,
    pub draft: BookDraft,
    pub total: Option<u64>,
    pub page_count: u64,
    pub in_flight: usize,
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_falls_back_to_displayed_length() {
        assert_eq!(page_count(None, 5, 12), 1);
        assert_eq!(page_count(None, 12, 12), 1);
        assert_eq!(page_count(None, 0, 12), 0);
    }

    #[test]
    fn page_count_prefers_reported_total() {
        assert_eq!(page_count(Some(25), 12, 12), 3);
        assert_eq!(page_count(Some(24), 12, 12), 2);
    }

    #[test]
    fn zero_page_or_size_is_rejected() {
        let mut query = QueryState::default();
        assert!(query.validate().is_ok());
        query.page = 0;
        assert!(matches!(query.validate(), Err(CatalogError::InvalidQuery(_))));
        query.page = 1;
        query.page_size = 0;
        assert!(matches!(query.validate(), Err(CatalogError::InvalidQuery(_))));
    }

    #[test]
    fn draft_fields_store_raw_text() {
        let mut draft = BookDraft::default();
        DraftField::Year.apply(&mut draft, "nineteen").expect("year");
        DraftField::Available
            .apply(&mut draft, "unavailable")
            .expect("available");
        assert_eq!(draft.year, "nineteen");
        assert!(!draft.available);
        assert!(DraftField::Available.apply(&mut draft, "maybe").is_err());
        assert!("isbn".parse::<DraftField>().is_err());
    }

    #[test]
    fn notice_mentions_context_and_transience() {
        let notice = Notice::from_error(
            NoticeContext::Delete,
            &CatalogError::Transport("connection refused".into()),
        );
        let rendered = notice.to_string();
        assert!(rendered.starts_with("Error deleting book"));
        assert!(rendered.contains("temporary"));
    }
}
