//! Subcommands and their rendering.
//!
//! Each command maps onto one service call. Output goes to a caller-supplied
//! writer so commands can be exercised without a terminal.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Subcommand, ValueEnum};
use serde_json::json;
use std::io::Write;
use todolist_core::{
    ItemId, ItemKind, ItemListQuery, ItemRepository, RecurrencePeriod, TodoItem, TodoListService,
    TodoService,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a task, recurring task or shopping item
    Add(AddArgs),
    /// List items, soonest due first
    List {
        /// Include completed items
        #[arg(long)]
        all: bool,
        /// Only show one kind of item
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Mark an item as completed
    Done { id: String },
    /// Show one item
    Show { id: String },
    /// List the dates an item was completed
    History { id: String },
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("variant").args(["deadline", "every", "amount"])))]
pub struct AddArgs {
    pub label: String,
    /// Deadline as YYYY-MM-DD
    #[arg(long)]
    pub deadline: Option<NaiveDate>,
    /// Repeat period in ISO-8601 form, e.g. P1D, P2W, P1M
    #[arg(long)]
    pub every: Option<RecurrencePeriod>,
    /// Amount to buy; makes this a shopping item
    #[arg(long)]
    pub amount: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Task,
    Recurring,
    ShoppingItem,
}

impl From<KindArg> for ItemKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Task => Self::Task,
            KindArg::Recurring => Self::Recurring,
            KindArg::ShoppingItem => Self::ShoppingItem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Runs one command against the service and renders its result.
pub fn run<R: ItemRepository>(
    command: Command,
    service: &mut TodoService<R>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Add(args) => {
            let label = args.label.as_str();
            let id = match (args.deadline, args.every, args.amount) {
                (Some(deadline), _, _) => service.add_task_with_deadline(label, deadline)?,
                (_, Some(period), _) => service.add_recurring_task(label, period)?,
                (_, _, Some(amount)) => service.add_shopping_item(label, amount)?,
                (None, None, None) => service.add_task(label)?,
            };
            let item = service.get_item(&id.to_string())?;
            match format {
                OutputFormat::Text => writeln!(out, "Added {} {}", item.kind, item.id)?,
                OutputFormat::Json => write_json(out, &item)?,
            }
        }
        Command::List { all, kind } => {
            let query = ItemListQuery {
                kind: kind.map(ItemKind::from),
                include_completed: all,
                ..ItemListQuery::default()
            };
            let items = service.list_items(&query)?;
            match format {
                OutputFormat::Text if items.is_empty() => writeln!(out, "No items.")?,
                OutputFormat::Text => {
                    for item in &items {
                        writeln!(out, "{}", summary_line(item))?;
                    }
                }
                OutputFormat::Json => write_json(out, &items)?,
            }
        }
        Command::Done { id } => {
            service.mark_completed(&id)?;
            let item = service.get_item(&id)?;
            match format {
                OutputFormat::Text => {
                    let next_due = item.due_on.filter(|_| item.kind == ItemKind::Recurring);
                    match next_due {
                        Some(next) => writeln!(out, "Completed {}; next due {next}", item.id)?,
                        None => writeln!(out, "Completed {}", item.id)?,
                    }
                }
                OutputFormat::Json => write_json(out, &item)?,
            }
        }
        Command::Show { id } => {
            let item = service.get_item(&id)?;
            match format {
                OutputFormat::Text => write_details(out, &item)?,
                OutputFormat::Json => write_json(out, &item)?,
            }
        }
        Command::History { id } => {
            let item = service.get_item(&id)?;
            let dates = service.completion_history(&id)?;
            match format {
                OutputFormat::Text if dates.is_empty() => writeln!(out, "No completions.")?,
                OutputFormat::Text => {
                    for date in &dates {
                        writeln!(out, "{date}")?;
                    }
                }
                OutputFormat::Json => write_json(out, &history_json(item.id, &dates))?,
            }
        }
    }
    Ok(())
}

fn summary_line(item: &TodoItem) -> String {
    let mut line = format!("{}  {:<13}  {}", item.id, item.kind, item.label);
    match item.kind {
        ItemKind::Task => {
            if let Some(deadline) = item.due_on {
                line.push_str(&format!("  (due {deadline})"));
            }
        }
        ItemKind::Recurring => {
            if let (Some(period), Some(next)) = (item.recurrence, item.due_on) {
                line.push_str(&format!("  (every {period}, next {next})"));
            }
        }
        ItemKind::ShoppingItem => {
            if let Some(amount) = item.amount {
                line.push_str(&format!("  x{amount}"));
            }
        }
    }
    if let Some(done) = item.completed_on {
        line.push_str(&format!("  [done {done}]"));
    }
    line
}

fn write_details(out: &mut dyn Write, item: &TodoItem) -> std::io::Result<()> {
    writeln!(out, "id:        {}", item.id)?;
    writeln!(out, "kind:      {}", item.kind)?;
    writeln!(out, "label:     {}", item.label)?;
    if let Some(due_on) = item.due_on {
        writeln!(out, "due:       {due_on}")?;
    }
    if let Some(period) = item.recurrence {
        writeln!(out, "every:     {period}")?;
    }
    if let Some(amount) = item.amount {
        writeln!(out, "amount:    {amount}")?;
    }
    match item.completed_on {
        Some(done) => writeln!(out, "completed: {done}"),
        None => writeln!(out, "completed: no"),
    }
}

fn history_json(id: ItemId, dates: &[NaiveDate]) -> serde_json::Value {
    json!({ "id": id, "completions": dates })
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run, AddArgs, Command, KindArg, OutputFormat};
    use chrono::NaiveDate;
    use todolist_core::db::open_db_in_memory;
    use todolist_core::{RecurrencePeriod, SqliteItemRepository, TodoService};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn add(label: &str) -> Command {
        Command::Add(AddArgs {
            label: label.to_string(),
            deadline: None,
            every: None,
            amount: None,
        })
    }

    fn run_text(service: &mut TodoService<SqliteItemRepository<'_>>, command: Command) -> String {
        let mut out = Vec::new();
        run(command, service, OutputFormat::Text, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn add_then_list_renders_kind_specific_details() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteItemRepository::try_new(&mut conn).unwrap();
        let mut service = TodoService::with_clock(repo, today);

        let added = run_text(&mut service, add("plain"));
        assert!(added.starts_with("Added task "));

        run_text(
            &mut service,
            Command::Add(AddArgs {
                label: "water plants".to_string(),
                deadline: None,
                every: Some(RecurrencePeriod::days(3)),
                amount: None,
            }),
        );
        run_text(
            &mut service,
            Command::Add(AddArgs {
                label: "eggs".to_string(),
                deadline: None,
                every: None,
                amount: Some(6),
            }),
        );

        let listed = run_text(
            &mut service,
            Command::List {
                all: false,
                kind: None,
            },
        );
        let lines: Vec<_> = listed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("water plants  (every P3D, next 2024-05-10)"));
        assert!(lines[1].ends_with("plain"));
        assert!(lines[2].ends_with("eggs  x6"));

        let shopping_only = run_text(
            &mut service,
            Command::List {
                all: false,
                kind: Some(KindArg::ShoppingItem),
            },
        );
        assert_eq!(shopping_only.lines().count(), 1);
    }

    #[test]
    fn done_reports_next_occurrence_for_recurring_items() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteItemRepository::try_new(&mut conn).unwrap();
        let mut service = TodoService::with_clock(repo, today);

        let mut out = Vec::new();
        run(
            Command::Add(AddArgs {
                label: "stretch".to_string(),
                deadline: None,
                every: Some(RecurrencePeriod::days(1)),
                amount: None,
            }),
            &mut service,
            OutputFormat::Json,
            &mut out,
        )
        .unwrap();
        let created: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let done = run_text(&mut service, Command::Done { id: id.clone() });
        assert_eq!(done.trim(), format!("Completed {id}; next due 2024-05-11"));

        let history = run_text(&mut service, Command::History { id });
        assert_eq!(history.trim(), "2024-05-10");
    }

    #[test]
    fn empty_list_and_unknown_id_are_reported() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteItemRepository::try_new(&mut conn).unwrap();
        let mut service = TodoService::with_clock(repo, today);

        let listed = run_text(
            &mut service,
            Command::List {
                all: true,
                kind: None,
            },
        );
        assert_eq!(listed.trim(), "No items.");

        let mut out = Vec::new();
        let err = run(
            Command::Done {
                id: "nope".to_string(),
            },
            &mut service,
            OutputFormat::Text,
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid item id"));
    }
}
