//! Interactive browse session.
//!
//! A reader thread forwards stdin lines into the async loop. Query changes run as background
//! tasks so a slow page never blocks input; a render task prints whatever page the view settles on.

use std::{
    fmt,
    future::Future,
    io::{self, BufRead, Write},
    sync::Arc,
    thread,
    time::Duration,
};

use anyhow::Result;
use client_core::{CatalogError, CatalogEvent, CatalogView, DeleteOutcome, RefreshOutcome};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    commands::{parse_command, BrowseCommand, HELP},
    prompt::LineConfirm,
    render,
};

fn spawn_stdin_reader(line_tx: mpsc::Sender<String>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
}

/// Output side of a session. Text is queued and written by a single printer task.
#[derive(Clone)]
pub struct Console {
    out: mpsc::UnboundedSender<String>,
}

impl Console {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (out, rx) = mpsc::unbounded_channel();
        (Self { out }, rx)
    }

    pub fn write(&self, text: impl Into<String>) {
        let _ = self.out.send(text.into());
    }

    pub fn say(&self, line: impl fmt::Display) {
        self.write(format!("{line}\n"));
    }

    fn prompt(&self) {
        self.write("> ");
    }
}

fn spawn_stdout_printer(mut output: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(text) = output.recv().await {
            let mut stdout = io::stdout().lock();
            let _ = stdout.write_all(text.as_bytes());
            let _ = stdout.flush();
        }
    })
}

fn spawn_renderer(view: Arc<CatalogView>, console: Console) -> JoinHandle<()> {
    let mut events = view.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CatalogEvent::BooksReplaced { .. }) => {
                    let snapshot = view.snapshot().await;
                    console.say(format_args!("\n{}", render::page_view(&snapshot)));
                }
                Ok(CatalogEvent::BookCreated(book)) => {
                    console.say(format_args!("added {}", render::book_line(&book)));
                }
                Ok(CatalogEvent::BookDeleted(id)) => console.say(format_args!("deleted #{id}")),
                Ok(CatalogEvent::BookUpdated(id)) => console.say(format_args!("updated #{id}")),
                Ok(CatalogEvent::DraftReset) => console.say("draft cleared"),
                Ok(CatalogEvent::Notice(notice)) => console.say(notice),
                Ok(CatalogEvent::StaleResponseDiscarded { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "browse: renderer lagged behind view events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Runs a query change in the background. Failures of the request itself surface as view
/// notices; rejected query values are reported here.
fn spawn_query_change<F, Fut>(view: &Arc<CatalogView>, console: &Console, change: F)
where
    F: FnOnce(Arc<CatalogView>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<RefreshOutcome, CatalogError>> + Send + 'static,
{
    let view = view.clone();
    let console = console.clone();
    tokio::spawn(async move {
        match change(view).await {
            Ok(RefreshOutcome::Unchanged) => console.say("(nothing to change)"),
            Ok(_) => {}
            Err(err @ CatalogError::InvalidQuery(_)) => console.say(err),
            Err(_) => {}
        }
    });
}

async fn dispatch(
    view: &Arc<CatalogView>,
    command: BrowseCommand,
    lines: &Arc<Mutex<mpsc::Receiver<String>>>,
    console: &Console,
) {
    debug!(command = command.name(), "browse: dispatching command");
    match command {
        BrowseCommand::NextPage => {
            spawn_query_change(view, console, |view| async move { view.next_page().await })
        }
        BrowseCommand::PrevPage => {
            spawn_query_change(view, console, |view| async move { view.prev_page().await })
        }
        BrowseCommand::Page(page) => spawn_query_change(view, console, move |view| async move {
            view.set_page(page).await
        }),
        BrowseCommand::Limit(limit) => spawn_query_change(view, console, move |view| async move {
            view.set_page_size(limit).await
        }),
        BrowseCommand::Sort(key) => spawn_query_change(view, console, move |view| async move {
            view.set_sort_key(key).await
        }),
        BrowseCommand::Order(order) => spawn_query_change(view, console, move |view| async move {
            view.set_sort_order(order).await
        }),
        BrowseCommand::FlipOrder => spawn_query_change(view, console, |view| async move {
            view.toggle_sort_order().await
        }),
        BrowseCommand::Refresh => {
            spawn_query_change(view, console, |view| async move { view.refresh().await })
        }
        BrowseCommand::SetDraft { field, value } => {
            if let Err(err) = view.set_draft_field(field, &value).await {
                console.say(err);
            }
        }
        BrowseCommand::ShowDraft => console.say(render::draft_view(&view.draft().await)),
        BrowseCommand::ClearDraft => view.reset_draft().await,
        BrowseCommand::Submit => {
            // Failures are already rendered from the notice event.
            let _ = view.create_book().await;
        }
        BrowseCommand::Delete(id) => {
            let prompt = LineConfirm::new(lines.clone(), console.clone());
            if let Ok(DeleteOutcome::Cancelled) = view.delete_book(id, &prompt).await {
                console.say("delete cancelled");
            }
        }
        BrowseCommand::Update { id, patch } => {
            let _ = view.update_book(id, patch).await;
        }
        BrowseCommand::Help => console.say(HELP),
        BrowseCommand::Quit => {}
    }
}

/// Reads commands from `lines` until it closes or `quit` is entered.
async fn session(view: Arc<CatalogView>, lines: mpsc::Receiver<String>, console: Console) {
    let lines = Arc::new(Mutex::new(lines));
    let renderer = spawn_renderer(view.clone(), console.clone());

    console.say("Library Management (type 'help' for commands)");
    let _ = view.mount().await;

    loop {
        console.prompt();
        let Some(line) = lines.lock().await.recv().await else {
            break;
        };
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(BrowseCommand::Quit)) => break,
            Ok(Some(command)) => dispatch(&view, command, &lines, &console).await,
            Err(message) => console.say(message),
        }
    }

    renderer.abort();
}

pub async fn run(view: Arc<CatalogView>) -> Result<()> {
    let (line_tx, line_rx) = mpsc::channel::<String>(64);
    spawn_stdin_reader(line_tx);
    let (console, output) = Console::new();
    let printer = spawn_stdout_printer(output);

    session(view, line_rx, console).await;

    // Background query tasks may still hold the console; give queued output a moment to land.
    let _ = tokio::time::timeout(Duration::from_millis(200), printer).await;
    Ok(())
}

#[cfg(test)]
#[path = "tests/browse_tests.rs"]
mod tests;
