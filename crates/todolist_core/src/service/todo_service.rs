//! Todo list use-case service.
//!
//! # Responsibility
//! - Implement the five todo list operations on top of a repository.
//! - Decide completion semantics per item kind.
//! - Offer read APIs used by front ends to refresh the open list.
//!
//! # Invariants
//! - Items are validated before they reach the repository.
//! - Completing a closed task or shopping item is a no-op.
//! - Completing a recurring item never closes it; `due_on` moves to
//!   `today + period`.
//! - Log lines carry ids and kinds only, never labels.

use crate::model::item::{is_storable_date, ItemId, ItemKind, ItemValidationError, TodoItem};
use crate::model::period::RecurrencePeriod;
use crate::repo::item_repo::{ItemCompletion, ItemListQuery, ItemRepository, RepoError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for todo list use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller passed an id that is not a UUID.
    InvalidItemId(String),
    ItemNotFound(ItemId),
    Validation(ItemValidationError),
    /// Next occurrence of a recurring item falls outside the storable years.
    RecurrenceOverflow(ItemId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidItemId(value) => write!(f, "invalid item id: `{value}`"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::RecurrenceOverflow(id) => {
                write!(f, "next occurrence of item {id} is out of calendar range")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent item state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ItemNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ItemValidationError> for ServiceError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// The todo list contract.
///
/// `add_*` operations return the id of the created item so callers can
/// later pass it to `mark_completed`.
pub trait TodoListService {
    fn add_task(&mut self, label: &str) -> ServiceResult<ItemId>;
    fn add_task_with_deadline(&mut self, label: &str, deadline: NaiveDate)
        -> ServiceResult<ItemId>;
    fn add_recurring_task(
        &mut self,
        label: &str,
        recurrence_period: RecurrencePeriod,
    ) -> ServiceResult<ItemId>;
    fn add_shopping_item(&mut self, label: &str, amount: u32) -> ServiceResult<ItemId>;
    fn mark_completed(&mut self, item_id: &str) -> ServiceResult<()>;
}

/// Today's date in the local time zone.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Repository-backed `TodoListService`.
pub struct TodoService<R: ItemRepository> {
    repo: R,
    today: fn() -> NaiveDate,
}

impl<R: ItemRepository> TodoService<R> {
    /// Creates a service that reads dates from the local clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, local_today)
    }

    /// Creates a service with a custom "today" source.
    pub fn with_clock(repo: R, today: fn() -> NaiveDate) -> Self {
        Self { repo, today }
    }

    /// Lists open items in display order.
    pub fn list_open_items(&self) -> ServiceResult<Vec<TodoItem>> {
        self.list_items(&ItemListQuery::default())
    }

    /// Lists items using filter and pagination options.
    pub fn list_items(&self, query: &ItemListQuery) -> ServiceResult<Vec<TodoItem>> {
        Ok(self.repo.list_items(query)?)
    }

    /// Gets one item by textual id.
    pub fn get_item(&self, item_id: &str) -> ServiceResult<TodoItem> {
        let id = parse_item_id(item_id)?;
        self.repo
            .get_item(id)?
            .ok_or(ServiceError::ItemNotFound(id))
    }

    /// Completion dates of one item, oldest first.
    pub fn completion_history(&self, item_id: &str) -> ServiceResult<Vec<NaiveDate>> {
        let item = self.get_item(item_id)?;
        Ok(self.repo.list_completions(item.id)?)
    }

    fn insert(&self, item: TodoItem) -> ServiceResult<ItemId> {
        let result = item
            .validate()
            .map_err(ServiceError::from)
            .and_then(|()| self.repo.create_item(&item).map_err(ServiceError::from));

        match result {
            Ok(id) => {
                info!(
                    "event=item_add module=service status=ok kind={} item_id={id}",
                    item.kind
                );
                Ok(id)
            }
            Err(err) => {
                warn!(
                    "event=item_add module=service status=error kind={} error={err}",
                    item.kind
                );
                Err(err)
            }
        }
    }
}

impl<R: ItemRepository> TodoListService for TodoService<R> {
    fn add_task(&mut self, label: &str) -> ServiceResult<ItemId> {
        self.insert(TodoItem::task(label))
    }

    fn add_task_with_deadline(
        &mut self,
        label: &str,
        deadline: NaiveDate,
    ) -> ServiceResult<ItemId> {
        self.insert(TodoItem::task_with_deadline(label, deadline))
    }

    fn add_recurring_task(
        &mut self,
        label: &str,
        recurrence_period: RecurrencePeriod,
    ) -> ServiceResult<ItemId> {
        let first_due = (self.today)();
        self.insert(TodoItem::recurring(label, recurrence_period, first_due))
    }

    fn add_shopping_item(&mut self, label: &str, amount: u32) -> ServiceResult<ItemId> {
        self.insert(TodoItem::shopping_item(label, amount))
    }

    fn mark_completed(&mut self, item_id: &str) -> ServiceResult<()> {
        let item = self.get_item(item_id)?;

        if item.is_completed() {
            debug!(
                "event=item_complete module=service status=skipped reason=already_completed item_id={}",
                item.id
            );
            return Ok(());
        }

        let today = (self.today)();
        let completion = completion_for(&item, today)?;
        let applied = match self.repo.complete_item(&completion) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(
                    "event=item_complete module=service status=error kind={} item_id={} error={err}",
                    item.kind, item.id
                );
                return Err(err.into());
            }
        };
        if !applied {
            debug!(
                "event=item_complete module=service status=skipped reason=closed_concurrently item_id={}",
                item.id
            );
            return Ok(());
        }

        match completion.next_due_on {
            Some(next_due_on) => info!(
                "event=item_complete module=service status=ok kind={} item_id={} next_due_on={next_due_on}",
                item.kind, item.id
            ),
            None => info!(
                "event=item_complete module=service status=ok kind={} item_id={}",
                item.kind, item.id
            ),
        }
        Ok(())
    }
}

fn completion_for(item: &TodoItem, today: NaiveDate) -> ServiceResult<ItemCompletion> {
    let next_due_on = match item.kind {
        ItemKind::Recurring => {
            let period = item.recurrence.ok_or(ServiceError::InconsistentState(
                "recurring item without recurrence period",
            ))?;
            Some(
                period
                    .add_to(today)
                    .filter(|next| is_storable_date(*next))
                    .ok_or(ServiceError::RecurrenceOverflow(item.id))?,
            )
        }
        ItemKind::Task | ItemKind::ShoppingItem => None,
    };

    Ok(ItemCompletion {
        item_id: item.id,
        completed_on: today,
        next_due_on,
    })
}

/// Parses a caller-supplied item id.
///
/// Surrounding whitespace is ignored; the nil UUID is rejected.
pub fn parse_item_id(value: &str) -> ServiceResult<ItemId> {
    let trimmed = value.trim();
    match Uuid::parse_str(trimmed) {
        Ok(id) if !id.is_nil() => Ok(id),
        _ => Err(ServiceError::InvalidItemId(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_item_id, ServiceError};
    use crate::model::item::ItemValidationError;
    use crate::repo::item_repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn parse_item_id_trims_and_accepts_uuid() {
        let id = Uuid::new_v4();
        let parsed = parse_item_id(&format!("  {id}\n")).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_item_id_rejects_garbage_and_nil() {
        for input in ["", "42", "not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
            let err = parse_item_id(input).unwrap_err();
            assert!(
                matches!(err, ServiceError::InvalidItemId(_)),
                "unexpected error for `{input}`: {err}"
            );
        }
    }

    #[test]
    fn repo_errors_map_to_semantic_service_errors() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ServiceError::from(RepoError::NotFound(id)),
            ServiceError::ItemNotFound(found) if found == id
        ));
        assert!(matches!(
            ServiceError::from(RepoError::Validation(ItemValidationError::EmptyLabel)),
            ServiceError::Validation(ItemValidationError::EmptyLabel)
        ));
        assert!(matches!(
            ServiceError::from(RepoError::InvalidData("x".to_string())),
            ServiceError::Repo(_)
        ));
    }
}
