//! HTTP access to the remote book catalog.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::BookId,
    error::ApiError,
    protocol::{Book, BookDraft, BookPatch, ListBooksQuery, ListBooksResponse},
};
use tracing::debug;
use url::Url;

use crate::error::CatalogError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_books(&self, query: &ListBooksQuery) -> Result<ListBooksResponse, CatalogError>;
    /// Returns the created book when the server echoes one back in a recognizable shape.
    async fn create_book(&self, draft: &BookDraft) -> Result<Option<Book>, CatalogError>;
    async fn delete_book(&self, id: BookId) -> Result<(), CatalogError>;
    async fn update_book(&self, id: BookId, patch: &BookPatch) -> Result<(), CatalogError>;
}

pub struct HttpCatalogApi {
    http: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout` of `None` leaves requests unbounded.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, CatalogError> {
        let base_url = parse_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn books_url(&self) -> Url {
        self.endpoint(&["books"])
    }

    fn book_url(&self, id: BookId) -> Url {
        self.endpoint(&["books", &id.to_string()])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn parse_base_url(raw: &str) -> Result<Url, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) url".to_string()));
    }
    Ok(url)
}

async fn ensure_success(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => api_error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };
    Err(CatalogError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_books(&self, query: &ListBooksQuery) -> Result<ListBooksResponse, CatalogError> {
        let response = self
            .http
            .get(self.books_url())
            .query(query)
            .send()
            .await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| CatalogError::Decode(err.to_string()))
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<Option<Book>, CatalogError> {
        let response = self.http.post(self.books_url()).json(draft).send().await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        match serde_json::from_slice::<Book>(&bytes) {
            Ok(book) => Ok(Some(book)),
            Err(err) => {
                debug!("catalog: create response did not decode as a book: {err}");
                Ok(None)
            }
        }
    }

    async fn delete_book(&self, id: BookId) -> Result<(), CatalogError> {
        let response = self.http.delete(self.book_url(id)).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_book(&self, id: BookId, patch: &BookPatch) -> Result<(), CatalogError> {
        let response = self
            .http
            .patch(self.book_url(id))
            .json(patch)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
