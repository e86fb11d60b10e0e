//! Branch reporter configuration.

use serde::Deserialize;
use std::time::Duration;

/// Log rate limits of the branch reporter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BranchReporterConfig {
    /// At most one branch log line per node per period.
    pub per_node_log_period_ms: u64,
    /// At most one excessive-branching line per period.
    pub excessive_branching_log_period_ms: u64,
}

impl Default for BranchReporterConfig {
    fn default() -> Self {
        Self {
            per_node_log_period_ms: 60_000,
            excessive_branching_log_period_ms: 60_000,
        }
    }
}

impl BranchReporterConfig {
    pub fn per_node_log_period(&self) -> Duration {
        Duration::from_millis(self.per_node_log_period_ms)
    }

    pub fn excessive_branching_log_period(&self) -> Duration {
        Duration::from_millis(self.excessive_branching_log_period_ms)
    }
}
