//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Helpers that must join a caller's
//! transaction take `&mut sqlx::Transaction<'_, sqlx::Postgres>` instead.

pub mod startup_history_repo;
pub mod startup_repo;
pub mod startup_status_history_repo;
pub mod status_repo;
pub mod task_repo;
pub mod workflow_action_repo;
pub mod workflow_condition_repo;
pub mod workflow_execution_log_repo;
pub mod workflow_repo;

pub use startup_history_repo::StartupHistoryRepo;
pub use startup_repo::StartupRepo;
pub use startup_status_history_repo::StartupStatusHistoryRepo;
pub use status_repo::StatusRepo;
pub use task_repo::TaskRepo;
pub use workflow_action_repo::WorkflowActionRepo;
pub use workflow_condition_repo::WorkflowConditionRepo;
pub use workflow_execution_log_repo::WorkflowExecutionLogRepo;
pub use workflow_repo::WorkflowRepo;
