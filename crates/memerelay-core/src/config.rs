//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! pipeline defaults.

use crate::dispatcher::{DEFAULT_BATCH_SIZE, DEFAULT_LOW_WATER_MARK};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregation accounts scraped when none are configured.
pub const DEFAULT_AGGREGATOR_HANDLES: &[&str] = &[
    "goatent_",
    "boomtv_hd",
    "igtweettv",
    "tweetsavages",
    "naijatwitter",
    "tiaentmedia",
    "moonscholar__",
    "memes_by_tola",
];

/// Apify actor used for scraping.
pub const DEFAULT_APIFY_ACTOR_ID: &str = "shu8hvrXbJbY3Eb9W";
/// Cadence of scheduled restocks.
pub const DEFAULT_RESTOCK_CRON: &str = "0 */4 * * *";
/// Cadence of scheduled batches.
pub const DEFAULT_BATCH_CRON: &str = "0 8,12,17,21 * * *";
/// Upper bound of one media fetch.
pub const DEFAULT_MEDIA_TIMEOUT_SECS: u64 = 30;

/// Pipeline settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RelaySettings {
    /// Apify API token
    pub apify_token: Option<String>,
    /// Apify actor identifier
    pub apify_actor_id: String,
    /// Persisted batch destination
    pub target_chat_id: Option<String>,
    /// Comma-separated aggregation handles
    #[serde(rename = "aggregator_handles")]
    pub aggregator_handles_str: Option<String>,
    /// Posts requested per scrape
    pub results_limit: u32,
    /// Items per scheduled batch
    pub batch_size: usize,
    /// Queue length below which a batch restocks first
    pub low_water_mark: usize,
    /// Deliveries remembered for resend requests
    pub history_capacity: usize,
    /// Lower bound of the inter-send delay, seconds
    pub pacing_min_secs: u64,
    /// Upper bound of the inter-send delay, seconds
    pub pacing_max_secs: u64,
    /// Upper bound of one media fetch, seconds
    pub media_timeout_secs: u64,
    /// Cron expression of scheduled restocks
    pub restock_cron: String,
    /// Cron expression of scheduled batches
    pub batch_cron: String,
    /// File the destination is persisted to
    pub env_file: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            apify_token: None,
            apify_actor_id: DEFAULT_APIFY_ACTOR_ID.to_string(),
            target_chat_id: None,
            aggregator_handles_str: None,
            results_limit: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            pacing_min_secs: 10,
            pacing_max_secs: 20,
            media_timeout_secs: DEFAULT_MEDIA_TIMEOUT_SECS,
            restock_cron: DEFAULT_RESTOCK_CRON.to_string(),
            batch_cron: DEFAULT_BATCH_CRON.to_string(),
            env_file: ".env".to_string(),
        }
    }
}

impl RelaySettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Configured aggregation handles, or the built-in list when unset.
    #[must_use]
    pub fn aggregator_handles(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .aggregator_handles_str
            .as_deref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .map(|h| h.trim_start_matches('@'))
                    .filter(|h| !h.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if configured.is_empty() {
            DEFAULT_AGGREGATOR_HANDLES
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            configured
        }
    }

    /// Inter-send delay bounds.
    #[must_use]
    pub const fn pacing_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.pacing_min_secs),
            Duration::from_secs(self.pacing_max_secs),
        )
    }

    /// Media fetch timeout.
    #[must_use]
    pub const fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs)
    }
}

/// Builds the layered configuration shared by all settings structs.
///
/// Sources in order: `config/default`, `config/{RUN_MODE}`, `config/local`,
/// `APP__` prefixed environment, then plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Environment::default() maps UPPER_SNAKE_CASE to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}
