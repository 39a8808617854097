//! Dealflow domain core.
//!
//! Pure logic shared by the persistence, automation and API crates: id and
//! timestamp aliases, [`error::CoreError`], the workflow rule vocabulary
//! (triggers, conditions, actions), placeholder substitution, priority
//! normalization, attribute coercion and status-history arithmetic. Nothing
//! in this crate performs I/O.

pub mod actions;
pub mod attributes;
pub mod conditions;
pub mod error;
pub mod pagination;
pub mod placeholders;
pub mod priority;
pub mod status_history;
pub mod types;
pub mod values;
pub mod workflow;
