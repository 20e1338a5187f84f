mod channels;
mod defaults;
mod providers;


pub use channels::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ZapError;
use defaults::*;

/// Top-level zapbot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Base directory for logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Input validation and rate limiting for `/bot` queries.
///
/// Empty `allowed_chats` means every chat is allowed; empty `blocked_users`
/// means nobody is blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    #[serde(default)]
    pub allowed_chats: Vec<String>,
    #[serde(default)]
    pub blocked_users: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_max: default_rate_limit_max(),
            allowed_chats: Vec::new(),
            blocked_users: Vec::new(),
        }
    }
}

/// Group statistics persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Directory holding one `<group>.json` snapshot per group.
    #[serde(default = "default_stats_dir")]
    pub data_dir: String,
    /// Flush a group's snapshot every N recorded messages.
    #[serde(default = "default_flush_every")]
    pub flush_every: u64,
    /// Interval of the periodic full save.
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_stats_dir(),
            flush_every: default_flush_every(),
            save_interval_secs: default_save_interval_secs(),
        }
    }
}

/// Short-term conversation memory for `/bot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_context_size")]
    pub max_messages: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: default_context_size(),
        }
    }
}

/// HTTP server for webhooks and the send relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl Config {
    /// Overlay secrets from the environment (or any key lookup).
    ///
    /// Recognized keys: `WHATSAPP_TOKEN`, `PHONE_NUMBER_ID`, `VERIFY_TOKEN`,
    /// `OPENAI_API_KEY`, `BRIDGE_CALLBACK_URL`. Setting a channel's key
    /// does not enable that channel.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.provider.openai.api_key = key;
        }

        let token = get("WHATSAPP_TOKEN");
        let phone = get("PHONE_NUMBER_ID");
        let verify = get("VERIFY_TOKEN");
        if token.is_some() || phone.is_some() || verify.is_some() {
            let cloud = self.channel.cloud.get_or_insert_with(CloudConfig::default);
            if let Some(v) = token {
                cloud.token = v;
            }
            if let Some(v) = phone {
                cloud.phone_number_id = v;
            }
            if let Some(v) = verify {
                cloud.verify_token = v;
            }
        }

        if let Some(url) = get("BRIDGE_CALLBACK_URL") {
            self.channel
                .bridge
                .get_or_insert_with(BridgeConfig::default)
                .callback_url = url;
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, ZapError> {
    let mut config = read_file(path)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn read_file(path: &str) -> Result<Config, ZapError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ZapError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content).map_err(|e| ZapError::Config(format!("failed to parse config: {}", e)))
}
