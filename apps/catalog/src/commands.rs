//! Commands typed into an interactive browse session.

use client_core::{parse_availability, DraftField};
use shared::{
    domain::{BookId, SortKey, SortOrder},
    protocol::BookPatch,
};

pub const HELP: &str = "\
commands:
  next | prev | page N       move between pages
  limit N                    books per page
  sort FIELD                 id, author, title, year, genre, pages, available
  order asc|desc | flip      sort direction
  refresh                    reload the current page
  set FIELD VALUE            edit the new-book draft
  draft | clear | submit     show, reset or submit the draft
  delete ID                  delete a book (asks first)
  update ID FIELD=VALUE...   change fields of a book
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    NextPage,
    PrevPage,
    Page(u32),
    Limit(u32),
    Sort(SortKey),
    Order(SortOrder),
    FlipOrder,
    Refresh,
    SetDraft { field: DraftField, value: String },
    ShowDraft,
    ClearDraft,
    Submit,
    Delete(BookId),
    Update { id: BookId, patch: BookPatch },
    Help,
    Quit,
}

impl BrowseCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BrowseCommand::NextPage => "next_page",
            BrowseCommand::PrevPage => "prev_page",
            BrowseCommand::Page(_) => "page",
            BrowseCommand::Limit(_) => "limit",
            BrowseCommand::Sort(_) => "sort",
            BrowseCommand::Order(_) => "order",
            BrowseCommand::FlipOrder => "flip_order",
            BrowseCommand::Refresh => "refresh",
            BrowseCommand::SetDraft { .. } => "set_draft",
            BrowseCommand::ShowDraft => "show_draft",
            BrowseCommand::ClearDraft => "clear_draft",
            BrowseCommand::Submit => "submit",
            BrowseCommand::Delete(_) => "delete",
            BrowseCommand::Update { .. } => "update",
            BrowseCommand::Help => "help",
            BrowseCommand::Quit => "quit",
        }
    }
}

fn required<'a>(arg: Option<&'a str>, usage: &str) -> Result<&'a str, String> {
    arg.filter(|value| !value.is_empty())
        .ok_or_else(|| format!("usage: {usage}"))
}

fn number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a valid {what}"))
}

/// Parses one input line. Returns `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<BrowseCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then_some(rest);

    let command = match verb.to_ascii_lowercase().as_str() {
        "next" | "n" => BrowseCommand::NextPage,
        "prev" | "p" => BrowseCommand::PrevPage,
        "page" => BrowseCommand::Page(number(required(arg, "page N")?, "page number")?),
        "limit" => BrowseCommand::Limit(number(required(arg, "limit N")?, "page size")?),
        "sort" => BrowseCommand::Sort(
            required(arg, "sort FIELD")?
                .parse::<SortKey>()
                .map_err(|err| err.to_string())?,
        ),
        "order" => BrowseCommand::Order(
            required(arg, "order asc|desc")?
                .parse::<SortOrder>()
                .map_err(|err| err.to_string())?,
        ),
        "flip" => BrowseCommand::FlipOrder,
        "refresh" | "r" => BrowseCommand::Refresh,
        "set" => {
            let rest = required(arg, "set FIELD VALUE")?;
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            BrowseCommand::SetDraft {
                field: field.parse::<DraftField>().map_err(|err| err.to_string())?,
                value: value.trim().to_string(),
            }
        }
        "draft" => BrowseCommand::ShowDraft,
        "clear" => BrowseCommand::ClearDraft,
        "submit" | "add" => BrowseCommand::Submit,
        "delete" | "rm" => BrowseCommand::Delete(number(required(arg, "delete ID")?, "book id")?),
        "update" => parse_update(required(arg, "update ID FIELD=VALUE...")?)?,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

/// `ID FIELD=VALUE...`; words without `=` continue the previous value.
fn parse_update(rest: &str) -> Result<BrowseCommand, String> {
    let mut words = rest.split_whitespace();
    let id: BookId = number(words.next().unwrap_or_default(), "book id")?;

    let mut assignments: Vec<(String, String)> = Vec::new();
    for word in words {
        match word.split_once('=') {
            Some((field, value)) => assignments.push((field.to_string(), value.to_string())),
            None => match assignments.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(word);
                }
                None => return Err(format!("expected FIELD=VALUE, got '{word}'")),
            },
        }
    }
    if assignments.is_empty() {
        return Err("usage: update ID FIELD=VALUE...".to_string());
    }

    let mut patch = BookPatch::default();
    for (field, value) in assignments {
        let field = field.parse::<DraftField>().map_err(|err| err.to_string())?;
        match field {
            DraftField::Author => patch.author = Some(value),
            DraftField::Title => patch.title = Some(value),
            DraftField::Genre => patch.genre = Some(value),
            DraftField::Year => patch.year = Some(number(&value, "year")?),
            DraftField::Pages => patch.pages = Some(number(&value, "page count")?),
            DraftField::Available => {
                patch.available = Some(parse_availability(&value).map_err(|err| err.to_string())?)
            }
        }
    }
    Ok(BrowseCommand::Update { id, patch })
}
