//! Build metadata, run ids and settle backoff

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Printed by `--version`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Random id for correlating the log lines of one run
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Doubling wait between settle polls, capped at `max`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollBackoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(8),
        }
    }
}

impl PollBackoff {
    /// Wait before poll number `attempt + 1`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}
