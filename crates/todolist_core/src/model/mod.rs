//! Domain model for todo list items.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one item shape for tasks, recurring tasks and shopping items.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Completion is a date stamp, not a hard delete.

pub mod item;
pub mod period;
