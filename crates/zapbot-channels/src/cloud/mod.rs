//! WhatsApp Cloud API channel (Meta Graph API).
//!
//! Inbound messages are pushed by Meta to the HTTP webhook and handed to
//! [`CloudChannel::ingest`]; replies go out through
//! `POST /{version}/{phone_number_id}/messages`.

mod send;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use zapbot_core::{
    config::CloudConfig,
    error::ZapError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// WhatsApp channel backed by the Cloud API.
pub struct CloudChannel {
    config: CloudConfig,
    client: reqwest::Client,
    base_url: String,
    /// Set by `start()`; webhook events are dropped while it is `None`.
    tx: Arc<Mutex<Option<mpsc::Sender<IncomingMessage>>>>,
}

impl CloudChannel {
    pub fn new(config: CloudConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            base_url: GRAPH_BASE_URL.to_string(),
            tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Endpoint for outbound messages.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.config.api_version, self.config.phone_number_id
        )
    }

    /// Answer Meta's subscription handshake (`GET /webhook`).
    pub fn verify_subscription(&self, mode: Option<&str>, token: Option<&str>) -> bool {
        !self.config.verify_token.is_empty()
            && mode == Some("subscribe")
            && token == Some(self.config.verify_token.as_str())
    }

    /// Forward the text messages of a webhook notification to the gateway.
    ///
    /// Returns how many messages were forwarded.
    pub async fn ingest(&self, payload: WebhookPayload) -> usize {
        let messages = extract_messages(payload);
        if messages.is_empty() {
            debug!("cloud: webhook event carries no text message");
            return 0;
        }

        let guard = self.tx.lock().await;
        let Some(tx) = guard.as_ref() else {
            debug!("cloud: channel not started, dropping {} message(s)", messages.len());
            return 0;
        };

        let mut forwarded = 0;
        for msg in messages {
            info!("cloud: message from {}", msg.sender_id);
            if tx.send(msg).await.is_err() {
                info!("cloud channel receiver dropped");
                break;
            }
            forwarded += 1;
        }
        forwarded
    }
}

/// Text messages of a notification as gateway events.
///
/// Cloud API conversations are one-to-one: the chat is the sender's number.
/// Non-text messages and status updates are skipped.
pub fn extract_messages(payload: WebhookPayload) -> Vec<IncomingMessage> {
    let mut out = Vec::new();

    for value in payload
        .entry
        .into_iter()
        .flat_map(|e| e.changes)
        .filter_map(|c| c.value)
    {
        let names: HashMap<String, String> = value
            .contacts
            .into_iter()
            .filter_map(|c| Some((c.wa_id, c.profile?.name?)))
            .collect();

        for msg in value.messages {
            let Some(text) = msg.text.map(|t| t.body) else {
                debug!(
                    "cloud: skipping {} message from {}",
                    msg.kind.as_deref().unwrap_or("unknown"),
                    msg.from
                );
                continue;
            };

            let mut incoming = IncomingMessage::new("cloud", &msg.from, &msg.from, &text);
            incoming.sender_name = names.get(&msg.from).cloned();
            if let Some(ts) = msg.timestamp.as_deref().and_then(parse_unix_seconds) {
                incoming.timestamp = ts;
            }
            out.push(incoming);
        }
    }

    out
}

fn parse_unix_seconds(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(raw.parse().ok()?, 0)
}

#[async_trait]
impl Channel for CloudChannel {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, ZapError> {
        if self.config.token.is_empty() || self.config.phone_number_id.is_empty() {
            return Err(ZapError::Channel(
                "cloud: token and phone_number_id are required".into(),
            ));
        }
        let (tx, rx) = mpsc::channel(64);
        *self.tx.lock().await = Some(tx);
        info!("Cloud API channel started (phone number {})", self.config.phone_number_id);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ZapError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| ZapError::Channel("no reply_target on outgoing message".into()))?;

        self.send_text(target, &message.text).await.map(|_| ())
    }

    async fn stop(&self) -> Result<(), ZapError> {
        *self.tx.lock().await = None;
        info!("Cloud API channel stopped");
        Ok(())
    }
}
