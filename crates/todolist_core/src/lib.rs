//! Core domain logic for the todo list.
//! This crate is the single source of truth for item invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::item::{
    is_storable_date, ItemId, ItemKind, ItemValidationError, TodoItem, MAX_LABEL_CHARS,
    STORABLE_YEARS,
};
pub use model::period::{PeriodParseError, RecurrencePeriod};
pub use repo::item_repo::{
    ItemCompletion, ItemListQuery, ItemRepository, RepoError, RepoResult, SqliteItemRepository,
};
pub use service::todo_service::{
    local_today, parse_item_id, ServiceError, ServiceResult, TodoListService, TodoService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
