//! `todolist` command line entry point.
//!
//! # Responsibility
//! - Parse flags, resolve settings and start optional file logging.
//! - Open the database and hand one command to the core service.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Command, OutputFormat};
use config::Settings;
use log::info;
use std::path::PathBuf;
use todolist_core::db::open_db;
use todolist_core::{init_logging, SqliteItemRepository, TodoService};

#[derive(Debug, Parser)]
#[command(name = "todolist", version, about = "Tasks, chores and shopping in one list.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database file
    #[arg(long, global = true, env = "TODOLIST_DB_PATH")]
    db: Option<PathBuf>,

    /// Directory for rolling log files (logging is off when unset)
    #[arg(long, global = true, env = "TODOLIST_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, env = "TODOLIST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(
        cli.db.as_deref(),
        cli.log_dir.as_deref(),
        cli.log_level.as_deref(),
    );

    if let Some(logging) = &settings.logging {
        init_logging(logging).context("failed to initialize logging")?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        todolist_core::core_version()
    );

    if let Some(parent) = settings.db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create database directory `{}`", parent.display())
        })?;
    }
    let mut conn = open_db(&settings.db_path).with_context(|| {
        format!("failed to open database `{}`", settings.db_path.display())
    })?;
    let repo = SqliteItemRepository::try_new(&mut conn)?;
    let mut service = TodoService::new(repo);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let mut stdout = std::io::stdout().lock();
    commands::run(cli.command, &mut service, format, &mut stdout)
}
