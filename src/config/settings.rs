// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::*;

/// OpenAI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (falls back to `OPENAI_API_KEY`). Commands that need the API
    /// answer with a configuration message when this is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for completions
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Model used for the moderation endpoint
    #[serde(default = "default_moderation_model")]
    pub moderation_model: String,

    /// Base URL (overridable for proxies and tests)
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_completion_model(),
            moderation_model: default_moderation_model(),
            base_url: default_base_url(),
        }
    }
}

/// Reminder scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Seconds between sweeps of the pending list
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound for a single reminder, in days
    #[serde(default = "default_max_days")]
    pub max_duration_days: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_secs(),
            max_duration_days: default_max_days(),
        }
    }
}

/// Feature flags configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Reply to "hello bot" in monitored channels
    #[serde(default = "default_true")]
    pub greet_on_hello: bool,

    /// Enable debug logging for troubleshooting
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            greet_on_hello: true,
            debug_logging: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_completion_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_moderation_model() -> String {
    DEFAULT_MODERATION_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_poll_secs() -> u64 {
    DEFAULT_REMINDER_POLL_SECS
}

fn default_max_days() -> u64 {
    DEFAULT_REMINDER_MAX_DAYS
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".hedgebot").join("data"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Bot configuration, as stored in `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token (falls back to `DISCORD_TOKEN`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discord_token: String,

    /// Command prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Channels whose messages are sent through moderation
    #[serde(default)]
    pub channels: Vec<u64>,

    /// Users whose messages are never moderated
    #[serde(default)]
    pub excluded_users: Vec<u64>,

    /// Users allowed to run administrative commands
    #[serde(default)]
    pub sudo: Vec<u64>,

    /// Directory holding the JSON stores and the audit log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub reminders: ReminderConfig,

    #[serde(default)]
    pub features: FeaturesConfig,

    /// Secrets filled in from the environment at load time
    #[serde(skip)]
    pub env_secrets: EnvSecrets,
}

/// Which secrets were taken from the environment rather than the file.
/// These are left out whenever the config is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvSecrets {
    pub discord_token: bool,
    pub openai_api_key: bool,
}

impl Config {
    /// Minimal config for a token and a first monitored channel
    pub fn new(discord_token: impl Into<String>, channels: Vec<u64>) -> Self {
        Self {
            discord_token: discord_token.into(),
            prefix: default_prefix(),
            channels,
            excluded_users: Vec::new(),
            sudo: Vec::new(),
            data_dir: default_data_dir(),
            openai: OpenAiConfig::default(),
            reminders: ReminderConfig::default(),
            features: FeaturesConfig::default(),
            env_secrets: EnvSecrets::default(),
        }
    }

    /// Copy of this config with environment-provided secrets removed
    pub fn without_env_secrets(&self) -> Config {
        let mut config = self.clone();
        if config.env_secrets.discord_token {
            config.discord_token.clear();
        }
        if config.env_secrets.openai_api_key {
            config.openai.api_key = None;
        }
        config.env_secrets = EnvSecrets::default();
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            bail!("discord_token is empty (set it in config.toml or DISCORD_TOKEN)");
        }
        if self.prefix.is_empty() {
            bail!("prefix must not be empty");
        }
        if self.reminders.poll_interval_secs == 0 {
            bail!("reminders.poll_interval_secs must be at least 1");
        }
        if self.reminders.max_duration_days == 0 {
            bail!("reminders.max_duration_days must be at least 1");
        }
        if self.reminders.max_duration_days > MAX_REMINDER_DAYS_LIMIT {
            bail!(
                "reminders.max_duration_days must be at most {}",
                MAX_REMINDER_DAYS_LIMIT
            );
        }
        Ok(())
    }

    pub fn is_monitored(&self, channel_id: u64) -> bool {
        self.channels.contains(&channel_id)
    }

    pub fn is_excluded(&self, user_id: u64) -> bool {
        self.excluded_users.contains(&user_id)
    }

    pub fn is_sudo(&self, user_id: u64) -> bool {
        self.sudo.contains(&user_id)
    }

    /// Add a monitored channel. Returns false if it was already monitored.
    pub fn add_channel(&mut self, channel_id: u64) -> bool {
        if self.is_monitored(channel_id) {
            return false;
        }
        self.channels.push(channel_id);
        true
    }

    /// Remove a monitored channel. Returns false if it was not monitored.
    pub fn remove_channel(&mut self, channel_id: u64) -> bool {
        let before = self.channels.len();
        self.channels.retain(|id| *id != channel_id);
        self.channels.len() != before
    }

    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Resolve a relative `data_dir` against the directory holding the config file
    pub fn anchor_data_dir(&mut self, config_path: &Path) {
        if self.data_dir.is_relative() {
            if let Some(parent) = config_path.parent() {
                self.data_dir = parent.join(&self.data_dir);
            }
        }
    }
}
