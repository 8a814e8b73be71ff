use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    parse_availability, AssumeYes, CatalogView, DeleteOutcome, HttpCatalogApi, QueryState,
};
use shared::{
    domain::{BookId, SortKey, SortOrder},
    protocol::{BookDraft, BookPatch},
};
use tracing_subscriber::EnvFilter;

mod browse;
mod commands;
mod config;
mod prompt;
mod render;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Browse and edit a remote book catalog")]
struct Cli {
    /// Base URL of the catalog API.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Settings file (defaults to $CATALOG_CONFIG, then ./catalog.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Per-request timeout in seconds; 0 disables it.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    sort_by: Option<SortKey>,
    #[arg(long)]
    order: Option<SortOrder>,
}

impl QueryArgs {
    fn apply(&self, base: QueryState) -> QueryState {
        QueryState {
            page: self.page.unwrap_or(base.page),
            page_size: self.limit.unwrap_or(base.page_size),
            sort_key: self.sort_by.unwrap_or(base.sort_key),
            sort_order: self.order.unwrap_or(base.sort_order),
        }
    }
}

fn parse_available_arg(raw: &str) -> Result<bool, String> {
    parse_availability(raw).map_err(|err| err.to_string())
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of books.
    List {
        #[command(flatten)]
        query: QueryArgs,
        /// Print the page as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add a book. Values are sent as typed; the server validates them.
    Add {
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        genre: String,
        #[arg(long, default_value = "")]
        pages: String,
        #[arg(long)]
        unavailable: bool,
    },
    /// Delete a book after confirmation.
    Delete {
        id: BookId,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Change some fields of a book.
    Update {
        id: BookId,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        pages: Option<i32>,
        #[arg(long, value_parser = parse_available_arg)]
        available: Option<bool>,
    },
    /// Interactive session (the default).
    Browse {
        #[command(flatten)]
        query: QueryArgs,
    },
}

fn build_view(cli: &Cli, settings: &Settings, query: &QueryArgs) -> Result<Arc<CatalogView>> {
    let mut settings = settings.clone();
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if cli.timeout_secs.is_some() {
        settings.request_timeout_secs = cli.timeout_secs;
    }

    let api = HttpCatalogApi::with_timeout(&settings.api_base_url, settings.request_timeout())
        .with_context(|| format!("cannot use catalog api at '{}'", settings.api_base_url))?;
    let query = query.apply(settings.query_state());
    query.validate()?;
    Ok(CatalogView::with_query(Arc::new(api), query))
}

async fn print_page(view: &CatalogView) {
    println!("{}", render::page_view(&view.snapshot().await));
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.clone());
    let default_query = QueryArgs::default();

    match &cli.command {
        None => {
            let view = build_view(&cli, &settings, &default_query)?;
            browse::run(view).await?;
        }
        Some(Command::Browse { query }) => {
            let view = build_view(&cli, &settings, query)?;
            browse::run(view).await?;
        }
        Some(Command::List { query, json }) => {
            let view = build_view(&cli, &settings, query)?;
            view.mount().await.context("failed to load books")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&view.books().await)?);
            } else {
                print_page(&view).await;
            }
        }
        Some(Command::Add {
            author,
            title,
            year,
            genre,
            pages,
            unavailable,
        }) => {
            let view = build_view(&cli, &settings, &default_query)?;
            view.update_draft(|draft| {
                *draft = BookDraft {
                    author: author.clone(),
                    title: title.clone(),
                    year: year.clone(),
                    genre: genre.clone(),
                    pages: pages.clone(),
                    available: !unavailable,
                }
            })
            .await;
            let created = view.create_book().await.context("failed to add book")?;
            match created {
                Some(book) => println!("added {}", render::book_line(&book)),
                None => println!("added book"),
            }
            print_page(&view).await;
        }
        Some(Command::Delete { id, yes }) => {
            let view = build_view(&cli, &settings, &default_query)?;
            let outcome = if *yes {
                view.delete_book(*id, &AssumeYes).await
            } else {
                view.delete_book(*id, &prompt::StdinConfirm).await
            }
            .with_context(|| format!("failed to delete book #{id}"))?;
            match outcome {
                DeleteOutcome::Deleted => {
                    println!("deleted #{id}");
                    print_page(&view).await;
                }
                DeleteOutcome::Cancelled => println!("delete cancelled"),
            }
        }
        Some(Command::Update {
            id,
            author,
            title,
            year,
            genre,
            pages,
            available,
        }) => {
            let patch = BookPatch {
                author: author.clone(),
                title: title.clone(),
                year: *year,
                genre: genre.clone(),
                pages: *pages,
                available: *available,
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            let view = build_view(&cli, &settings, &default_query)?;
            view.update_book(*id, patch)
                .await
                .with_context(|| format!("failed to update book #{id}"))?;
            println!("updated #{id}");
            print_page(&view).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_list_query_flags() {
        let cli = Cli::parse_from([
            "catalog", "list", "--page", "2", "--limit", "6", "--sort-by", "title", "--order",
            "desc",
        ]);
        let Some(Command::List { query, json }) = cli.command else {
            panic!("expected list command");
        };
        assert!(!json);
        assert_eq!(
            query.apply(QueryState::default()),
            QueryState {
                page: 2,
                page_size: 6,
                sort_key: SortKey::Title,
                sort_order: SortOrder::Desc,
            }
        );
    }

    #[test]
    fn query_args_fall_back_to_settings() {
        let base = QueryState {
            page_size: 20,
            sort_order: SortOrder::Desc,
            ..QueryState::default()
        };
        assert_eq!(QueryArgs::default().apply(base), base);
    }

    #[test]
    fn cli_parses_update_availability_words() {
        let cli = Cli::parse_from(["catalog", "update", "5", "--available", "unavailable"]);
        let Some(Command::Update { id, available, .. }) = cli.command else {
            panic!("expected update command");
        };
        assert_eq!(id, BookId(5));
        assert_eq!(available, Some(false));
    }

    #[test]
    fn no_subcommand_means_browse() {
        let cli = Cli::parse_from(["catalog", "--api-url", "http://books.local"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.api_url.as_deref(), Some("http://books.local"));
    }

    #[test]
    fn build_view_rejects_bad_base_url() {
        let cli = Cli::parse_from(["catalog", "--api-url", "books.local"]);
        let err = build_view(&cli, &Settings::default(), &QueryArgs::default())
            .err()
            .expect("bad url");
        assert!(err.to_string().contains("books.local"));
    }
}
