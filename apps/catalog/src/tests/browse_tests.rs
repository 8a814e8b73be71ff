use super::*;
use async_trait::async_trait;
use client_core::CatalogApi;
use shared::{
    domain::BookId,
    protocol::{Book, BookDraft, BookPatch, ListBooksQuery, ListBooksResponse},
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List(ListBooksQuery),
    Delete(BookId),
}

/// Serves a fixed shelf of books and records list and delete calls.
#[derive(Default)]
struct ShelfApi {
    calls: Mutex<Vec<Call>>,
}

impl ShelfApi {
    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }
}

fn shelf() -> Vec<Book> {
    vec![
        Book {
            id: BookId(3),
            author: "Frank Herbert".into(),
            title: "Dune".into(),
            year: 1965,
            genre: "sf".into(),
            pages: 412,
            available: true,
        },
        Book {
            id: BookId(4),
            author: "Ursula K. Le Guin".into(),
            title: "The Dispossessed".into(),
            year: 1974,
            genre: "sf".into(),
            pages: 387,
            available: false,
        },
    ]
}

#[async_trait]
impl CatalogApi for ShelfApi {
    async fn list_books(&self, query: &ListBooksQuery) -> Result<ListBooksResponse, CatalogError> {
        self.calls.lock().await.push(Call::List(*query));
        Ok(ListBooksResponse {
            books: shelf(),
            total: None,
        })
    }

    async fn create_book(&self, _draft: &BookDraft) -> Result<Option<Book>, CatalogError> {
        Ok(None)
    }

    async fn delete_book(&self, id: BookId) -> Result<(), CatalogError> {
        self.calls.lock().await.push(Call::Delete(id));
        Ok(())
    }

    async fn update_book(&self, _id: BookId, _patch: &BookPatch) -> Result<(), CatalogError> {
        Ok(())
    }
}

struct Harness {
    api: Arc<ShelfApi>,
    input: mpsc::Sender<String>,
    output: mpsc::UnboundedReceiver<String>,
    seen: String,
    task: JoinHandle<()>,
}

impl Harness {
    fn start() -> Self {
        let api = Arc::new(ShelfApi::default());
        let view = CatalogView::new(api.clone());
        let (input, lines) = mpsc::channel(16);
        let (console, output) = Console::new();
        let task = tokio::spawn(session(view, lines, console));
        Self {
            api,
            input,
            output,
            seen: String::new(),
            task,
        }
    }

    async fn send(&self, line: &str) {
        self.input.send(line.to_string()).await.expect("session input");
    }

    async fn expect_output(&mut self, needle: &str) {
        let _ = tokio::time::timeout(Duration::from_secs(2), async {
            while !self.seen.contains(needle) {
                match self.output.recv().await {
                    Some(text) => self.seen.push_str(&text),
                    None => break,
                }
            }
        })
        .await;
        assert!(
            self.seen.contains(needle),
            "expected {needle:?} in output:\n{}",
            self.seen
        );
    }

    async fn finish(self) -> String {
        drop(self.input);
        let _ = tokio::time::timeout(Duration::from_secs(2), self.task).await;
        self.seen
    }
}

#[tokio::test]
async fn session_renders_the_first_page_on_start() {
    let mut harness = Harness::start();

    harness.expect_output("#3 Frank Herbert - Dune").await;
    harness.expect_output("page 1 of 1").await;
    assert_eq!(harness.api.calls().await.len(), 1);
    harness.finish().await;
}

#[tokio::test]
async fn delete_reads_confirmation_from_the_next_line() {
    let mut harness = Harness::start();
    harness.expect_output("page 1 of 1").await;

    harness.send("delete 3").await;
    harness
        .expect_output("Are you sure you want to delete this book? [y/N] ")
        .await;
    harness.send("y").await;
    harness.expect_output("deleted #3").await;

    let calls = harness.api.calls().await;
    assert!(calls.contains(&Call::Delete(BookId(3))));
    let seen = harness.finish().await;
    assert!(!seen.contains("unknown command 'y'"));
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let mut harness = Harness::start();
    harness.expect_output("page 1 of 1").await;

    harness.send("delete 4").await;
    harness.send("n").await;
    harness.expect_output("delete cancelled").await;

    assert!(!harness
        .api
        .calls()
        .await
        .iter()
        .any(|call| matches!(call, Call::Delete(_))));
    harness.finish().await;
}

#[tokio::test]
async fn rejected_page_size_is_reported_without_fetching() {
    let mut harness = Harness::start();
    harness.expect_output("page 1 of 1").await;

    harness.send("limit 0").await;
    harness
        .expect_output("invalid query state: page size must be at least 1")
        .await;

    assert_eq!(harness.api.calls().await.len(), 1);
    harness.finish().await;
}

#[tokio::test]
async fn query_changes_run_in_the_background_and_refetch() {
    let mut harness = Harness::start();
    harness.expect_output("page 1 of 1").await;

    harness.send("sort title").await;
    harness.expect_output("sorted by title asc").await;
    harness.send("sort title").await;
    harness.expect_output("(nothing to change)").await;

    let lists: Vec<_> = harness
        .api
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            Call::List(query) => Some(query.sort_by),
            Call::Delete(_) => None,
        })
        .collect();
    assert_eq!(
        lists,
        vec![shared::domain::SortKey::Id, shared::domain::SortKey::Title]
    );
    harness.finish().await;
}

#[tokio::test]
async fn parse_errors_are_printed_and_session_continues() {
    let mut harness = Harness::start();
    harness.expect_output("page 1 of 1").await;

    harness.send("teleport").await;
    harness
        .expect_output("unknown command 'teleport' (try 'help')")
        .await;
    harness.send("set year 1999").await;
    harness.send("draft").await;
    harness.expect_output("year: 1999").await;
    harness.finish().await;
}
