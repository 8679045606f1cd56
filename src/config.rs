use config::{Config, File};
pub use config::ConfigError;
use serde::Deserialize;

use crate::market::{ConfirmPolicy, MarketConfig};

/// Main configuration struct
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Market configuration (state file, confirmation window, policy)
    #[serde(default)]
    pub market: MarketSettings,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct MarketSettings {
    /// Path of the persisted market book
    #[serde(default = "default_state_file")]
    pub state_file: Option<String>,
    /// Seconds a recycle preview waits for 「确认回收」
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    /// "recycle_current" or "require_unchanged"
    #[serde(default)]
    pub confirm_policy: ConfirmPolicy,
}

fn default_state_file() -> Option<String> {
    Some("data/market_book.json".to_string())
}

fn default_confirm_timeout_secs() -> u64 {
    30
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            confirm_policy: ConfirmPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LogConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from a configuration file
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Add configuration file
            .add_source(File::with_name(config_path))
            // Add environment variables (overrides file)
            // e.g. APP_MARKET__CONFIRM_TIMEOUT_SECS=60
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Market configuration derived from these settings
    pub fn market_config(&self) -> MarketConfig {
        let mut market = MarketConfig::new()
            .with_confirm_timeout(self.market.confirm_timeout_secs)
            .with_confirm_policy(self.market.confirm_policy);
        if let Some(path) = &self.market.state_file {
            market = market.with_state_file(path);
        }
        market
    }
}
