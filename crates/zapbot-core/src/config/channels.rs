use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub cloud: Option<CloudConfig>,
    pub bridge: Option<BridgeConfig>,
}

/// WhatsApp Cloud API config (Meta Graph API).
///
/// Inbound messages arrive on `POST /webhook`; `verify_token` answers the
/// subscription challenge on `GET /webhook`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Permanent or temporary access token.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub verify_token: String,
    #[serde(default = "default_graph_api_version")]
    pub api_version: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token: String::new(),
            phone_number_id: String::new(),
            verify_token: String::new(),
            api_version: default_graph_api_version(),
        }
    }
}

/// Bridge channel config.
///
/// A WhatsApp-Web bridge process owns the session, POSTs chat events to
/// `/message` and receives replies on `callback_url`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub callback_url: String,
}
