//! Engine configuration loaded from environment variables.

use std::time::Duration;

/// Default per-action timeout in seconds.
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// Runtime knobs for [`crate::WorkflowEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single action's run time. A timeout fails the
    /// action; the remaining actions still run.
    pub action_timeout: Duration,
    /// Write a `skipped` execution log when a matched workflow fails its
    /// conditions.
    pub log_skipped: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(DEFAULT_ACTION_TIMEOUT_SECS),
            log_skipped: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `WORKFLOW_ACTION_TIMEOUT_SECS` | `30`    |
    /// | `WORKFLOW_LOG_SKIPPED`         | `true`  |
    pub fn from_env() -> Self {
        let action_timeout_secs: u64 = std::env::var("WORKFLOW_ACTION_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_ACTION_TIMEOUT_SECS.to_string())
            .parse()
            .expect("WORKFLOW_ACTION_TIMEOUT_SECS must be a valid u64");

        let log_skipped = std::env::var("WORKFLOW_LOG_SKIPPED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Self {
            action_timeout: Duration::from_secs(action_timeout_secs),
            log_skipped,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
