//! Interactive table session: one command per line on stdin.

use std::io::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::resources::{self, Resource};
use crate::table::export::export_records;
use crate::table::paginate::PageSizeError;
use crate::table::render::render;
use crate::table::{DataTable, DateRange, PageSize, TableRow};

pub const HELP: &str = "\
Commands:
  next | prev | first | last     move between pages
  page N                         jump to page N
  size N                         rows per page (5, 10, 20, 30, 40, 50)
  sort COLUMN | sort clear       toggle sorting on a column, or drop all sorting
  search [TEXT]                  free-text filter (blank clears it)
  status VALUE                   status filter (\"View All\" clears it)
  range FROM TO | range clear    date filter, dates as YYYY-MM-DD
  select ID | select #N          toggle one row
  select page | select all       select the page or every filtered row
  unselect page | unselect all   clear the page or the whole selection
  export [PATH]                  write filtered rows (.xlsx or .csv)
  refresh                        fetch the rows again
  delete                         delete the selected rows
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRef {
    Id(String),
    /// 1-based position in the filtered, sorted view.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Previous,
    First,
    Last,
    /// 1-based page number.
    Page(usize),
    Size(PageSize),
    Sort(String),
    ClearSort,
    Search(String),
    Status(String),
    Range(DateRange),
    Select(RowRef),
    SelectPage,
    SelectAll,
    UnselectPage,
    UnselectAll,
    Export(Option<PathBuf>),
    Refresh,
    Delete,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("no command given")]
    Empty,
    #[error("unknown command `{0}` (type `help` for a list)")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{value}` is not a valid {expected}")]
    InvalidArgument {
        value: String,
        expected: &'static str,
    },
    #[error(transparent)]
    PageSize(#[from] PageSizeError),
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, expected })
    } else {
        Ok(rest)
    }
}

fn number(value: &str, expected: &'static str) -> Result<usize, CommandError> {
    value
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| CommandError::InvalidArgument {
            value: value.to_string(),
            expected,
        })
}

fn date(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CommandError::InvalidArgument {
        value: value.to_string(),
        expected: "date (YYYY-MM-DD)",
    })
}

fn parse_range(rest: &str) -> Result<DateRange, CommandError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [clear] if clear.eq_ignore_ascii_case("clear") => Ok(DateRange::default()),
        [from, to] => Ok(DateRange::new(Some(date(from)?), Some(date(to)?))),
        _ => Err(CommandError::MissingArgument {
            command: "range",
            expected: "FROM TO or `clear`",
        }),
    }
}

fn parse_select(rest: &str) -> Result<BrowseCommand, CommandError> {
    let target = required(rest, "select", "an id, #N, `page` or `all`")?;
    if target.eq_ignore_ascii_case("page") {
        return Ok(BrowseCommand::SelectPage);
    }
    if target.eq_ignore_ascii_case("all") {
        return Ok(BrowseCommand::SelectAll);
    }
    match target.strip_prefix('#') {
        Some(position) => Ok(BrowseCommand::Select(RowRef::Position(number(
            position,
            "row position",
        )?))),
        None => Ok(BrowseCommand::Select(RowRef::Id(target.to_string()))),
    }
}

impl FromStr for BrowseCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "next" | "n" => BrowseCommand::Next,
            "prev" | "previous" | "p" => BrowseCommand::Previous,
            "first" => BrowseCommand::First,
            "last" => BrowseCommand::Last,
            "page" => {
                let value = required(rest, "page", "a page number")?;
                BrowseCommand::Page(number(value, "page number")?)
            }
            "size" => {
                let value = required(rest, "size", "a page size")?;
                let size = value.parse::<usize>().map_err(|_| CommandError::InvalidArgument {
                    value: value.to_string(),
                    expected: "page size",
                })?;
                BrowseCommand::Size(PageSize::try_from(size)?)
            }
            "sort" => match required(rest, "sort", "a column id")? {
                "clear" => BrowseCommand::ClearSort,
                column => BrowseCommand::Sort(column.to_string()),
            },
            "search" => BrowseCommand::Search(rest.to_string()),
            "status" => BrowseCommand::Status(required(rest, "status", "a status value")?.to_string()),
            "range" => BrowseCommand::Range(parse_range(rest)?),
            "select" => parse_select(rest)?,
            "unselect" => match rest.to_ascii_lowercase().as_str() {
                "page" => BrowseCommand::UnselectPage,
                "all" => BrowseCommand::UnselectAll,
                _ => {
                    return Err(CommandError::MissingArgument {
                        command: "unselect",
                        expected: "`page` or `all`",
                    })
                }
            },
            "export" => BrowseCommand::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "refresh" => BrowseCommand::Refresh,
            "delete" => BrowseCommand::Delete,
            "help" | "?" => BrowseCommand::Help,
            "quit" | "exit" | "q" => BrowseCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// What the loop should do after a command was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Message(String),
    Export(Option<PathBuf>),
    Refresh,
    Delete,
    Help,
    Quit,
}

fn toggle_reference<T: TableRow>(table: &mut DataTable<T>, reference: RowRef) -> Outcome {
    let id = match reference {
        RowRef::Id(id) => {
            if !table.data().iter().any(|row| row.row_id() == id) {
                return Outcome::Message(format!("No row with id {id}."));
            }
            id
        }
        RowRef::Position(position) => match position
            .checked_sub(1)
            .and_then(|index| table.filtered_rows().get(index).map(|row| row.row_id()))
        {
            Some(id) => id,
            None => return Outcome::Message(format!("No row #{position} in the current view.")),
        },
    };
    table.toggle_row(&id);
    Outcome::Render
}

/// Applies the table-local part of a command.
pub fn apply<T: TableRow>(table: &mut DataTable<T>, command: BrowseCommand) -> Outcome {
    match command {
        BrowseCommand::Next => table.next_page(),
        BrowseCommand::Previous => table.previous_page(),
        BrowseCommand::First => table.first_page(),
        BrowseCommand::Last => table.last_page(),
        BrowseCommand::Page(number) => table.go_to_page(number.saturating_sub(1)),
        BrowseCommand::Size(size) => table.set_page_size(size),
        BrowseCommand::Sort(column) => {
            if !table.toggle_sort(&column) {
                return Outcome::Message(format!("Column `{column}` cannot be sorted."));
            }
        }
        BrowseCommand::ClearSort => table.clear_sort(),
        BrowseCommand::Search(text) => table.set_free_text(text),
        BrowseCommand::Status(status) => table.set_status(status),
        BrowseCommand::Range(range) => table.set_date_range(range),
        BrowseCommand::Select(reference) => return toggle_reference(table, reference),
        BrowseCommand::SelectPage => table.toggle_all_page_rows(true),
        BrowseCommand::SelectAll => table.toggle_all_filtered_rows(true),
        BrowseCommand::UnselectPage => table.toggle_all_page_rows(false),
        BrowseCommand::UnselectAll => table.clear_selection(),
        BrowseCommand::Export(path) => return Outcome::Export(path),
        BrowseCommand::Refresh => return Outcome::Refresh,
        BrowseCommand::Delete => return Outcome::Delete,
        BrowseCommand::Help => return Outcome::Help,
        BrowseCommand::Quit => return Outcome::Quit,
    }
    Outcome::Render
}

pub fn default_export_path<R: Resource>() -> PathBuf {
    PathBuf::from(format!("{}.xlsx", R::NAME))
}

async fn refresh<R: Resource>(
    client: &ApiClient,
    scope: Option<&str>,
    table: &mut DataTable<R>,
) -> Result<(), ApiError> {
    let data = resources::fetch_all::<R>(client, scope).await?;
    table.set_data(data);
    Ok(())
}

async fn delete_selected<R: Resource>(client: &ApiClient, table: &DataTable<R>) -> usize {
    let ids: Vec<String> = table.selected_rows().iter().map(|row| row.row_id()).collect();
    let mut deleted = 0;
    for id in &ids {
        match resources::delete::<R>(client, id).await {
            Ok(_) => deleted += 1,
            Err(err) => report_failure(&format!("Deleting {id}"), &err),
        }
    }
    deleted
}

fn report_failure(action: &str, err: &ApiError) {
    if err.is_unauthorized() {
        println!("{action} failed: {err}. Sign in again with `quanskill-portal sign-in`.");
    } else {
        println!("{action} failed: {err}");
    }
}

fn prompt(name: &str) {
    print!("{name}> ");
    let _ = std::io::stdout().flush();
}

/// Runs the browse loop until `quit` or end of input.
pub async fn run<R: Resource>(client: &ApiClient, scope: Option<&str>) -> anyhow::Result<()> {
    let data = resources::fetch_all::<R>(client, scope)
        .await
        .with_context(|| format!("failed to load {}", R::NAME))?;
    let mut table = resources::new_table(data);
    println!("{}", render(&table));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(R::NAME);
        let Some(line) = lines.next_line().await.context("failed to read command")? else {
            break;
        };
        let command = match line.parse::<BrowseCommand>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        tracing::debug!(?command, "browse command");

        match apply(&mut table, command) {
            Outcome::Render => println!("{}", render(&table)),
            Outcome::Message(message) => println!("{message}"),
            Outcome::Help => {
                println!("{HELP}");
                println!("Status values: {}", R::STATUS_OPTIONS.join(", "));
                let sortable: Vec<&str> = table
                    .columns()
                    .iter()
                    .filter(|column| column.sortable)
                    .map(|column| column.id)
                    .collect();
                println!("Sortable columns: {}", sortable.join(", "));
            }
            Outcome::Quit => break,
            Outcome::Export(path) => {
                let path = path.unwrap_or_else(default_export_path::<R>);
                let rows = table.filtered_rows();
                match export_records(&rows, R::SHEET, &path) {
                    Ok(summary) => println!(
                        "Exported {} row(s) to {}.",
                        summary.records,
                        path.display()
                    ),
                    Err(err) => println!("Export failed: {err}"),
                }
            }
            Outcome::Refresh => match refresh(client, scope, &mut table).await {
                Ok(()) => println!("{}", render(&table)),
                Err(err) => report_failure("Refresh", &err),
            },
            Outcome::Delete => {
                if table.filtered_selected_count() == 0 {
                    println!("No rows selected.");
                    continue;
                }
                let deleted = delete_selected(client, &table).await;
                println!("Deleted {deleted} row(s).");
                match refresh(client, scope, &mut table).await {
                    Ok(()) => println!("{}", render(&table)),
                    Err(err) => report_failure("Refresh", &err),
                }
            }
        }
    }
    Ok(())
}
