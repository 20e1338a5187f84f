use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix WhatsApp uses for group chat identifiers.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Whether a WhatsApp chat id names a group.
pub fn is_group_chat(chat_id: &str) -> bool {
    chat_id.ends_with(GROUP_SUFFIX)
}

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "cloud", "bridge").
    pub channel: String,
    /// Chat the message was posted in (group id or the peer's id).
    pub chat_id: String,
    /// Author of the message. Equals `chat_id` for direct messages.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Whether this message comes from a group chat.
    #[serde(default)]
    pub is_group: bool,
    /// Display name of the group, when known.
    #[serde(default)]
    pub group_name: Option<String>,
}

impl IncomingMessage {
    /// Build a message stamped with a fresh id and the current time.
    pub fn new(channel: &str, chat_id: &str, sender_id: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: None,
            text: text.to_string(),
            timestamp: Utc::now(),
            is_group: is_group_chat(chat_id),
            group_name: None,
        }
    }
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub metadata: MessageMetadata,
    /// Chat the message is delivered to.
    #[serde(default)]
    pub reply_target: Option<String>,
    /// User ids mentioned in `text` (group replies only).
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl OutgoingMessage {
    /// Plain text reply to a chat.
    pub fn text(target: &str, text: &str) -> Self {
        Self {
            text: text.to_string(),
            reply_target: Some(target.to_string()),
            ..Default::default()
        }
    }
}

/// Metadata about how a message was generated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageMetadata {
    /// Which provider produced this response.
    pub provider_used: String,
    /// Token count (if available from the provider).
    pub tokens_used: Option<u64>,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Model identifier (if applicable).
    pub model: Option<String>,
}
