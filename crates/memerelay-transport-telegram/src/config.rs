//! Telegram transport settings.

use config::ConfigError;
use memerelay_core::config::RelaySettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Initial backoff between Telegram API retries.
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound of one backoff step.
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4_000;
/// Retries after the first attempt.
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    pub telegram_token: String,
    /// Comma-separated list of user IDs allowed to run privileged commands.
    #[serde(rename = "owner_ids")]
    pub owner_ids_str: Option<String>,
    /// Forbid forwarding and saving of dispatched images.
    #[serde(default = "default_protect_content")]
    pub protect_content: bool,
}

const fn default_protect_content() -> bool {
    true
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Pipeline settings shared across transport handlers.
    pub relay: Arc<RelaySettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(relay: RelaySettings, telegram: TelegramSettings) -> Self {
        Self {
            relay: Arc::new(relay),
            telegram: Arc::new(telegram),
        }
    }
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        memerelay_core::config::build_config()?.try_deserialize()
    }

    /// Returns the set of owner user IDs.
    #[must_use]
    pub fn owner_ids(&self) -> HashSet<i64> {
        self.owner_ids_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
