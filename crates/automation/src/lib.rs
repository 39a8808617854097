//! Workflow automation engine and status-history tracking.
//!
//! A domain mutation enters through [`WorkflowEngine`]: the resolver selects
//! active workflows whose trigger matches, the gate checks their conditions,
//! the runner executes their actions in order and every run is written to
//! the execution log. [`StatusHistoryTracker`] maintains the status
//! occupancy intervals independently of workflow outcomes.
//!
//! All storage goes through [`AutomationStore`] and all mail through
//! [`dealflow_notify::MailTransport`], so both can be swapped in tests.

pub mod actions;
pub mod config;
pub mod engine;
pub mod gate;
pub mod history;
pub mod logger;
pub mod pg_store;
pub mod resolver;
pub mod runner;
pub mod store;
pub mod target;

pub use config::EngineConfig;
pub use engine::WorkflowEngine;
pub use history::{StatusHistoryTracker, TrackerError};
pub use logger::ExecutionSummary;
pub use pg_store::PgAutomationStore;
pub use store::{AutomationStore, StoreError};
pub use target::TargetEntity;
