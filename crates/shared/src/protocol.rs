use serde::{Deserialize, Serialize};

use crate::domain::{BookId, SortKey, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub author: String,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub pages: i32,
    pub available: bool,
}

/// Unsaved book as typed into the create form.
///
/// Numeric fields stay as the raw text the user entered; the server owns validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub author: String,
    pub title: String,
    pub year: String,
    pub genre: String,
    pub pages: String,
    pub available: bool,
}

impl Default for BookDraft {
    fn default() -> Self {
        Self {
            author: String::new(),
            title: String::new(),
            year: String::new(),
            genre: String::new(),
            pages: String::new(),
            available: true,
        }
    }
}

impl BookDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBooksQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}
