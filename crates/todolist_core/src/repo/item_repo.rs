//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and completion APIs over the `items` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `TodoItem::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - A completion and its item update commit together or not at all.
//! - A closed item is never completed twice, even across connections.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::item::{is_storable_date, ItemId, ItemKind, ItemValidationError, TodoItem};
use crate::model::period::RecurrencePeriod;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    label,
    due_on,
    recurrence,
    amount,
    completed_on
FROM items";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    InvalidData(String),
    /// Connection was not opened through `open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    pub kind: Option<ItemKind>,
    pub include_completed: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// One completion to persist for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCompletion {
    pub item_id: ItemId,
    pub completed_on: NaiveDate,
    /// `Some` reschedules the item instead of closing it.
    pub next_due_on: Option<NaiveDate>,
}

impl ItemCompletion {
    /// Checks that both dates can be stored as ordered date text.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        let dates = [
            ("completed_on", Some(self.completed_on)),
            ("next_due_on", self.next_due_on),
        ];
        for (field, value) in dates {
            if let Some(date) = value.filter(|date| !is_storable_date(*date)) {
                return Err(ItemValidationError::DateOutOfRange { field, date });
            }
        }
        Ok(())
    }
}

/// Repository interface for todo items.
pub trait ItemRepository {
    fn create_item(&self, item: &TodoItem) -> RepoResult<ItemId>;
    fn update_item(&self, item: &TodoItem) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<TodoItem>>;
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<TodoItem>>;
    /// Appends a history row and closes or reschedules the item atomically.
    ///
    /// Returns `false` without writing when a closing completion hits an
    /// item that is already closed.
    fn complete_item(&mut self, completion: &ItemCompletion) -> RepoResult<bool>;
    /// Completion dates for one item, oldest first.
    fn list_completions(&self, id: ItemId) -> RepoResult<Vec<NaiveDate>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// Rejects connections that skipped `open_db*` bootstrap.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &TodoItem) -> RepoResult<ItemId> {
        item.validate()?;

        self.conn.execute(
            "INSERT INTO items (
                uuid,
                kind,
                label,
                due_on,
                recurrence,
                amount,
                completed_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.id.to_string(),
                item.kind.as_str(),
                item.label.trim(),
                item.due_on.map(date_to_db),
                item.recurrence.map(|period| period.to_string()),
                item.amount.map(i64::from),
                item.completed_on.map(date_to_db),
            ],
        )?;

        Ok(item.id)
    }

    fn update_item(&self, item: &TodoItem) -> RepoResult<()> {
        item.validate()?;

        let changed = self.conn.execute(
            "UPDATE items
             SET
                kind = ?1,
                label = ?2,
                due_on = ?3,
                recurrence = ?4,
                amount = ?5,
                completed_on = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?7;",
            params![
                item.kind.as_str(),
                item.label.trim(),
                item.due_on.map(date_to_db),
                item.recurrence.map(|period| period.to_string()),
                item.amount.map(i64::from),
                item.completed_on.map(date_to_db),
                item.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(item.id));
        }

        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<TodoItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }

        Ok(None)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<TodoItem>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_completed {
            sql.push_str(" AND completed_on IS NULL");
        }

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        // Dated items first, soonest due on top; undated keep insertion order.
        sql.push_str(" ORDER BY due_on IS NULL ASC, due_on ASC, created_at ASC, rowid ASC");

        match (query.limit, query.offset) {
            (Some(limit), 0) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                bind_values.push(Value::Integer(i64::from(offset)));
            }
            (None, 0) => {}
            (None, offset) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(offset)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    fn complete_item(&mut self, completion: &ItemCompletion) -> RepoResult<bool> {
        completion.validate()?;

        let item_id_text = completion.item_id.to_string();
        let completed_on_text = date_to_db(completion.completed_on);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Re-read under the write lock; another connection may have closed it.
        let current: Option<Option<String>> = tx
            .query_row(
                "SELECT completed_on FROM items WHERE uuid = ?1;",
                [item_id_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let already_closed = match current {
            None => return Err(RepoError::NotFound(completion.item_id)),
            Some(completed_on) => completed_on.is_some(),
        };
        if already_closed && completion.next_due_on.is_none() {
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO completions (item_uuid, completed_on) VALUES (?1, ?2);",
            params![item_id_text.as_str(), completed_on_text.as_str()],
        )?;

        match completion.next_due_on {
            Some(next_due_on) => {
                tx.execute(
                    "UPDATE items
                     SET
                        due_on = ?2,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![item_id_text.as_str(), date_to_db(next_due_on)],
                )?;
            }
            None => {
                tx.execute(
                    "UPDATE items
                     SET
                        completed_on = ?2,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![item_id_text.as_str(), completed_on_text.as_str()],
                )?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn list_completions(&self, id: ItemId) -> RepoResult<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT completed_on
             FROM completions
             WHERE item_uuid = ?1
             ORDER BY completed_on ASC, id ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut dates = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            dates.push(parse_date(&value, "completions.completed_on")?);
        }
        Ok(dates)
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<TodoItem> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in items.uuid"))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = ItemKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item kind `{kind_text}` in items.kind"))
    })?;

    let recurrence = match row.get::<_, Option<String>>("recurrence")? {
        Some(value) => Some(value.parse::<RecurrencePeriod>().map_err(|err| {
            RepoError::InvalidData(format!("{err} in items.recurrence"))
        })?),
        None => None,
    };

    let amount = match row.get::<_, Option<i64>>("amount")? {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid amount `{value}` in items.amount"))
        })?),
        None => None,
    };

    let item = TodoItem {
        id,
        kind,
        label: row.get("label")?,
        due_on: parse_optional_date(row, "due_on")?,
        recurrence,
        amount,
        completed_on: parse_optional_date(row, "completed_on")?,
    };
    item.validate()?;
    Ok(item)
}

fn parse_optional_date(row: &Row<'_>, column: &'static str) -> RepoResult<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(column)? {
        Some(value) => Ok(Some(parse_date(&value, column)?)),
        None => Ok(None),
    }
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["items", "completions"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
