//! Client-side core of the book catalog: the remote API seam and the catalog view controller.

pub mod error;
pub mod transport;
pub mod types;
pub mod view;

pub use error::CatalogError;
pub use transport::{CatalogApi, HttpCatalogApi, DEFAULT_API_BASE_URL};
pub use types::{
    page_count, parse_availability, CatalogEvent, CatalogSnapshot, DeleteOutcome, DraftField,
    Notice, NoticeContext, QueryState, RefreshOutcome, DEFAULT_PAGE_SIZE,
};
pub use view::{AssumeNo, AssumeYes, CatalogView, ConfirmPrompt, DELETE_CONFIRMATION};
