//! Plain-text rendering of the catalog view.

use std::fmt::Write as _;

use client_core::CatalogSnapshot;
use shared::protocol::{Book, BookDraft};

pub fn availability_label(available: bool) -> &'static str {
    if available {
        "Available"
    } else {
        "Not Available"
    }
}

pub fn book_line(book: &Book) -> String {
    format!(
        "#{} {} - {} | {} | {} | {} pages | {}",
        book.id,
        book.author,
        book.title,
        book.year,
        book.genre,
        book.pages,
        availability_label(book.available)
    )
}

pub fn page_view(snapshot: &CatalogSnapshot) -> String {
    let mut out = String::new();
    if snapshot.books.is_empty() {
        out.push_str("(no books on this page)\n");
    }
    for book in &snapshot.books {
        out.push_str(&book_line(book));
        out.push('\n');
    }

    let query = snapshot.query;
    let _ = write!(
        out,
        "page {} of {} | {} per page | sorted by {} {}",
        query.page,
        snapshot.page_count.max(1),
        query.page_size,
        query.sort_key,
        query.sort_order
    );
    if let Some(total) = snapshot.total {
        let _ = write!(out, " | {total} books");
    }
    if snapshot.in_flight > 0 {
        let _ = write!(out, " | loading ({} pending)", snapshot.in_flight);
    }
    out
}

pub fn draft_view(draft: &BookDraft) -> String {
    let field = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "author: {}\ntitle: {}\nyear: {}\ngenre: {}\npages: {}\navailable: {}",
        field(&draft.author),
        field(&draft.title),
        field(&draft.year),
        field(&draft.genre),
        field(&draft.pages),
        availability_label(draft.available)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::QueryState;
    use shared::domain::BookId;

    fn snapshot(books: Vec<Book>, total: Option<u64>) -> CatalogSnapshot {
        CatalogSnapshot {
            page_count: client_core::page_count(total, books.len(), 12),
            books,
            query: QueryState::default(),
            draft: BookDraft::default(),
            total,
            in_flight: 0,
            generation: 1,
            refreshed_at: None,
        }
    }

    fn dune() -> Book {
        Book {
            id: BookId(3),
            author: "Frank Herbert".into(),
            title: "Dune".into(),
            year: 1965,
            genre: "sf".into(),
            pages: 412,
            available: false,
        }
    }

    #[test]
    fn renders_book_card_fields() {
        assert_eq!(
            book_line(&dune()),
            "#3 Frank Herbert - Dune | 1965 | sf | 412 pages | Not Available"
        );
    }

    #[test]
    fn footer_shows_position_and_total() {
        let rendered = page_view(&snapshot(vec![dune()], Some(30)));
        assert!(rendered.ends_with("page 1 of 3 | 12 per page | sorted by id asc | 30 books"));
    }

    #[test]
    fn empty_page_still_reports_one_page() {
        let rendered = page_view(&snapshot(Vec::new(), None));
        assert!(rendered.starts_with("(no books on this page)"));
        assert!(rendered.contains("page 1 of 1"));
    }

    #[test]
    fn draft_view_marks_blank_fields() {
        let rendered = draft_view(&BookDraft::default());
        assert!(rendered.contains("author: -"));
        assert!(rendered.ends_with("available: Available"));
    }
}
