//! WhatsApp Cloud API webhook deserialization types.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;

/// Body of a `POST /webhook` notification.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<ChangeValue>,
}

/// `entry[].changes[].value`: messages and the contacts that sent them.
/// Status notifications carry neither.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<CloudMessage>,
    #[serde(default)]
    pub contacts: Vec<CloudContact>,
}

#[derive(Debug, Deserialize)]
pub struct CloudMessage {
    /// Sender phone number.
    pub from: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Unix seconds, as a string.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// "text", "image", "audio", ...
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<CloudText>,
}

#[derive(Debug, Deserialize)]
pub struct CloudText {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudContact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<CloudProfile>,
}

#[derive(Debug, Deserialize)]
pub struct CloudProfile {
    #[serde(default)]
    pub name: Option<String>,
}
