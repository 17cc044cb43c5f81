//! Runtime settings resolution for the CLI.
//!
//! # Responsibility
//! - Turn flags and `TODOLIST_*` environment values into concrete paths.
//! - Keep defaults in one place.
//!
//! # Invariants
//! - The resolved log directory is absolute.
//! - An empty or whitespace-only value counts as unset.

use std::path::{Path, PathBuf};
use todolist_core::{default_log_level, LoggingConfig};

const APP_DIR_NAME: &str = "todolist";
const DB_FILE_NAME: &str = "todolist.sqlite3";

/// Fully resolved settings for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    /// `None` keeps logging disabled.
    pub logging: Option<LoggingConfig>,
}

impl Settings {
    pub fn resolve(
        db: Option<&Path>,
        log_dir: Option<&Path>,
        log_level: Option<&str>,
    ) -> Self {
        let db_path = non_empty_path(db)
            .map(Path::to_path_buf)
            .unwrap_or_else(default_db_path);

        let logging = non_empty_path(log_dir).map(|dir| {
            let level = log_level
                .map(str::trim)
                .filter(|level| !level.is_empty())
                .unwrap_or(default_log_level());
            LoggingConfig::new(level, absolutize(dir))
        });

        Self { db_path, logging }
    }
}

/// `<data_local_dir>/todolist/todolist.sqlite3`, or the temp dir when the
/// platform has no data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

fn non_empty_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|value| !value.to_string_lossy().trim().is_empty())
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
