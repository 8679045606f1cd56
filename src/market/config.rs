//! Market configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a confirmed recycle does when the previewed length has gone stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmPolicy {
    /// Recycle whatever length exists at confirmation time
    RecycleCurrent,
    /// Fail the confirmation if the length changed since the preview
    RequireUnchanged,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self::RecycleCurrent
    }
}

/// Market configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Where the market book is persisted; `None` keeps it in memory only
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Seconds a recycle preview waits for 「确认回收」
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Behavior when previewed and live length differ at confirmation
    #[serde(default)]
    pub confirm_policy: ConfirmPolicy,
}

fn default_confirm_timeout_secs() -> u64 {
    30
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            confirm_timeout_secs: default_confirm_timeout_secs(),
            confirm_policy: ConfirmPolicy::default(),
        }
    }
}

impl MarketConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state file path for persistence
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Set the confirmation window in seconds
    pub fn with_confirm_timeout(mut self, secs: u64) -> Self {
        self.confirm_timeout_secs = secs;
        self
    }

    /// Set the stale-preview policy
    pub fn with_confirm_policy(mut self, policy: ConfirmPolicy) -> Self {
        self.confirm_policy = policy;
        self
    }

    /// Confirmation window as a [`Duration`]
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}
