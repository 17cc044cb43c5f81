//! Todo item domain model.
//!
//! # Responsibility
//! - Define the canonical record shared by task, recurring and shopping
//!   item projections.
//! - Own the per-kind shape rules through `TodoItem::validate()`.
//!
//! # Invariants
//! - `id` is stable, never nil and never reused for another item.
//! - `label` is non-empty after trimming and at most `MAX_LABEL_CHARS`.
//! - Recurring items never close; their completions live in history.
//! - Deserialization runs the same validation as repository writes.
//! - Dates stay within `STORABLE_YEARS` so their `YYYY-MM-DD` text sorts
//!   chronologically.

use crate::model::period::RecurrencePeriod;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Maximum label length in characters (not bytes).
pub const MAX_LABEL_CHARS: usize = 500;

/// Years whose dates render as four-digit `YYYY-MM-DD` text.
pub const STORABLE_YEARS: RangeInclusive<i32> = 0..=9999;

/// Returns whether `date` can be stored and ordered as ISO date text.
pub fn is_storable_date(date: NaiveDate) -> bool {
    STORABLE_YEARS.contains(&date.year())
}

/// Stable identifier for every todo item.
pub type ItemId = Uuid;

/// Item category. Decides which optional fields are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// One-off task with an optional deadline.
    Task,
    /// Task that repeats every `recurrence` period.
    Recurring,
    /// Something to buy, with an amount.
    ShoppingItem,
}

impl ItemKind {
    /// Stable string id used in storage and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Recurring => "recurring",
            Self::ShoppingItem => "shopping_item",
        }
    }

    /// Parses the stable string id produced by `as_str`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task" => Some(Self::Task),
            "recurring" => Some(Self::Recurring),
            "shopping_item" => Some(Self::ShoppingItem),
            _ => None,
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Shape violations detected by `TodoItem::validate()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilId,
    EmptyLabel,
    LabelTooLong { chars: usize, max: usize },
    /// A field is set that the item kind does not allow.
    UnexpectedField { kind: ItemKind, field: &'static str },
    /// A field the item kind requires is missing.
    MissingField { kind: ItemKind, field: &'static str },
    ZeroRecurrence,
    ZeroAmount,
    DateOutOfRange {
        field: &'static str,
        date: NaiveDate,
    },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
            Self::EmptyLabel => write!(f, "label must not be empty"),
            Self::LabelTooLong { chars, max } => {
                write!(f, "label has {chars} characters; at most {max} allowed")
            }
            Self::UnexpectedField { kind, field } => {
                write!(f, "{kind} items must not set `{field}`")
            }
            Self::MissingField { kind, field } => write!(f, "{kind} items require `{field}`"),
            Self::ZeroRecurrence => write!(f, "recurrence period must not be zero"),
            Self::ZeroAmount => write!(f, "amount must be at least 1"),
            Self::DateOutOfRange { field, date } => {
                write!(f, "`{field}` {date} is outside years 0000 to 9999")
            }
        }
    }
}

impl Error for ItemValidationError {}

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTodoItem")]
pub struct TodoItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub label: String,
    /// Deadline for tasks, next occurrence for recurring items.
    pub due_on: Option<NaiveDate>,
    pub recurrence: Option<RecurrencePeriod>,
    pub amount: Option<u32>,
    pub completed_on: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RawTodoItem {
    id: ItemId,
    kind: ItemKind,
    label: String,
    #[serde(default)]
    due_on: Option<NaiveDate>,
    #[serde(default)]
    recurrence: Option<RecurrencePeriod>,
    #[serde(default)]
    amount: Option<u32>,
    #[serde(default)]
    completed_on: Option<NaiveDate>,
}

impl TryFrom<RawTodoItem> for TodoItem {
    type Error = ItemValidationError;

    fn try_from(raw: RawTodoItem) -> Result<Self, Self::Error> {
        let item = Self {
            id: raw.id,
            kind: raw.kind,
            label: raw.label.trim().to_string(),
            due_on: raw.due_on,
            recurrence: raw.recurrence,
            amount: raw.amount,
            completed_on: raw.completed_on,
        };
        item.validate()?;
        Ok(item)
    }
}

impl TodoItem {
    /// Creates a plain task with a generated id.
    pub fn task(label: impl Into<String>) -> Self {
        Self::blank(Uuid::new_v4(), ItemKind::Task, label)
    }

    /// Creates a task that must be done by `deadline`.
    pub fn task_with_deadline(label: impl Into<String>, deadline: NaiveDate) -> Self {
        let mut item = Self::task(label);
        item.due_on = Some(deadline);
        item
    }

    /// Creates a recurring task whose first occurrence is due on `first_due`.
    pub fn recurring(
        label: impl Into<String>,
        period: RecurrencePeriod,
        first_due: NaiveDate,
    ) -> Self {
        let mut item = Self::blank(Uuid::new_v4(), ItemKind::Recurring, label);
        item.recurrence = Some(period);
        item.due_on = Some(first_due);
        item
    }

    /// Creates a shopping list entry.
    pub fn shopping_item(label: impl Into<String>, amount: u32) -> Self {
        let mut item = Self::blank(Uuid::new_v4(), ItemKind::ShoppingItem, label);
        item.amount = Some(amount);
        item
    }

    /// Creates an item with a caller-provided id and no optional fields.
    ///
    /// Rejects the nil UUID; other shape rules are checked by `validate()`.
    pub fn with_id(
        id: ItemId,
        kind: ItemKind,
        label: impl Into<String>,
    ) -> Result<Self, ItemValidationError> {
        if id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        Ok(Self::blank(id, kind, label))
    }

    fn blank(id: ItemId, kind: ItemKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            label: label.into().trim().to_string(),
            due_on: None,
            recurrence: None,
            amount: None,
            completed_on: None,
        }
    }

    /// Returns whether the item no longer shows up in the open list.
    pub fn is_completed(&self) -> bool {
        self.completed_on.is_some()
    }

    /// Checks identity, label and per-kind field shape.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }

        let label = self.label.trim();
        if label.is_empty() {
            return Err(ItemValidationError::EmptyLabel);
        }
        let chars = label.chars().count();
        if chars > MAX_LABEL_CHARS {
            return Err(ItemValidationError::LabelTooLong {
                chars,
                max: MAX_LABEL_CHARS,
            });
        }

        for (field, value) in [("due_on", self.due_on), ("completed_on", self.completed_on)] {
            if let Some(date) = value.filter(|date| !is_storable_date(*date)) {
                return Err(ItemValidationError::DateOutOfRange { field, date });
            }
        }

        let kind = self.kind;
        let unexpected = |field| ItemValidationError::UnexpectedField { kind, field };
        let missing = |field| ItemValidationError::MissingField { kind, field };

        match kind {
            ItemKind::Task => {
                if self.recurrence.is_some() {
                    return Err(unexpected("recurrence"));
                }
                if self.amount.is_some() {
                    return Err(unexpected("amount"));
                }
            }
            ItemKind::Recurring => {
                match self.recurrence {
                    None => return Err(missing("recurrence")),
                    Some(period) if period.is_zero() => {
                        return Err(ItemValidationError::ZeroRecurrence)
                    }
                    Some(_) => {}
                }
                if self.due_on.is_none() {
                    return Err(missing("due_on"));
                }
                if self.amount.is_some() {
                    return Err(unexpected("amount"));
                }
                if self.completed_on.is_some() {
                    return Err(unexpected("completed_on"));
                }
            }
            ItemKind::ShoppingItem => {
                match self.amount {
                    None => return Err(missing("amount")),
                    Some(0) => return Err(ItemValidationError::ZeroAmount),
                    Some(_) => {}
                }
                if self.recurrence.is_some() {
                    return Err(unexpected("recurrence"));
                }
                if self.due_on.is_some() {
                    return Err(unexpected("due_on"));
                }
            }
        }

        Ok(())
    }
}
