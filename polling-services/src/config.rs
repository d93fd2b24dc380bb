use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Settings for the poller and its collaborators.
///
/// Sources, lowest priority first: built-in defaults, an optional
/// `mailwatch.toml` in the working directory, then environment variables
/// (`POLL_INTERVAL_SECONDS`, `TELEGRAM_BOT_TOKEN`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Where the authorization flow writes the OAuth token bundle
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,

    /// Initial delay between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: f64,

    /// Maximum unread messages fetched per poll
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Notify for mail that is already unread when the first poll runs
    #[serde(default)]
    pub notify_existing_on_start: bool,

    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_poll_interval() -> f64 {
    60.0
}

fn default_max_results() -> u32 {
    5
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl PollingConfig {
    /// Load from `mailwatch.toml` (if present) and the process environment
    pub fn load() -> Result<Self> {
        Self::from_builder(
            config::Config::builder()
                .add_source(File::with_name("mailwatch").required(false))
                .add_source(Environment::default()),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("Failed to read polling configuration")?
            .try_deserialize()
            .context("Invalid polling configuration")
    }

    /// Telegram credentials, when both halves are configured
    pub fn telegram(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some((token.as_str(), chat.as_str()))
            }
            _ => None,
        }
    }
}
