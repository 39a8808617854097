//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Filter or update DTOs where the API needs them

pub mod startup;
pub mod startup_history;
pub mod startup_status_history;
pub mod status;
pub mod task;
pub mod workflow;
pub mod workflow_action;
pub mod workflow_condition;
pub mod workflow_execution_log;
