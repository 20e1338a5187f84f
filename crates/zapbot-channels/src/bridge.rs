//! WhatsApp-Web bridge channel.
//!
//! A separate bridge process owns the WhatsApp Web session (QR pairing,
//! reconnects). It POSTs every chat event to `/message` and receives the
//! bot's replies as JSON on `callback_url`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use zapbot_core::{
    config::BridgeConfig,
    error::ZapError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};

/// Chat event posted by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEvent {
    /// Group id (`…@g.us`) or the peer's id for direct messages.
    pub chat_id: String,
    /// Author inside a group. Absent for direct messages.
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    pub body: String,
    #[serde(default)]
    pub group_name: Option<String>,
}

impl BridgeEvent {
    pub fn into_incoming(self) -> IncomingMessage {
        let sender = self.author_id.as_deref().unwrap_or(&self.chat_id);
        let mut msg = IncomingMessage::new("bridge", &self.chat_id, sender, &self.body);
        msg.sender_name = self.author_name;
        msg.group_name = self.group_name;
        msg
    }
}

/// Reply delivered to the bridge.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BridgeReply<'a> {
    chat_id: &'a str,
    text: &'a str,
    mentions: &'a [String],
}

/// Channel relaying through an external WhatsApp-Web bridge.
pub struct BridgeChannel {
    config: BridgeConfig,
    client: reqwest::Client,
    tx: Arc<Mutex<Option<mpsc::Sender<IncomingMessage>>>>,
}

impl BridgeChannel {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Hand one bridge event to the gateway.
    ///
    /// Returns `false` when the channel is not running.
    pub async fn ingest(&self, event: BridgeEvent) -> bool {
        let guard = self.tx.lock().await;
        let Some(tx) = guard.as_ref() else {
            debug!("bridge: channel not started, dropping event from {}", event.chat_id);
            return false;
        };
        if tx.send(event.into_incoming()).await.is_err() {
            info!("bridge channel receiver dropped");
            return false;
        }
        true
    }
}

#[async_trait]
impl Channel for BridgeChannel {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, ZapError> {
        if self.config.callback_url.is_empty() {
            return Err(ZapError::Channel("bridge: callback_url is required".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        *self.tx.lock().await = Some(tx);
        info!("Bridge channel started (replies to {})", self.config.callback_url);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ZapError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| ZapError::Channel("no reply_target on outgoing message".into()))?;

        let reply = BridgeReply {
            chat_id: target,
            text: &message.text,
            mentions: &message.mentions,
        };

        let resp = self
            .client
            .post(&self.config.callback_url)
            .json(&reply)
            .send()
            .await
            .map_err(|e| ZapError::Channel(format!("bridge send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ZapError::Channel(format!(
                "bridge send failed ({status}): {text}"
            )));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ZapError> {
        *self.tx.lock().await = None;
        info!("Bridge channel stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BridgeConfig {
        BridgeConfig {
            enabled: true,
            callback_url: "http://127.0.0.1:3001/reply".into(),
        }
    }

    #[test]
    fn test_group_event_into_incoming() {
        let event: BridgeEvent = serde_json::from_str(
            r#"{"chatId":"120363@g.us","authorId":"5511999@c.us","authorName":"Ana","body":"oi pessoal","groupName":"Família"}"#,
        )
        .unwrap();
        let msg = event.into_incoming();
        assert_eq!(msg.channel, "bridge");
        assert_eq!(msg.chat_id, "120363@g.us");
        assert_eq!(msg.sender_id, "5511999@c.us");
        assert_eq!(msg.sender_name.as_deref(), Some("Ana"));
        assert_eq!(msg.group_name.as_deref(), Some("Família"));
        assert!(msg.is_group);
    }

    #[test]
    fn test_direct_event_sender_is_chat() {
        let event: BridgeEvent =
            serde_json::from_str(r#"{"chatId":"5511999@c.us","body":"!ping"}"#).unwrap();
        let msg = event.into_incoming();
        assert_eq!(msg.sender_id, "5511999@c.us");
        assert!(!msg.is_group);
        assert!(msg.group_name.is_none());
    }

    #[test]
    fn test_reply_serialization() {
        let mentions = vec!["5511999@c.us".to_string()];
        let reply = BridgeReply {
            chat_id: "120363@g.us",
            text: "@5511999 pong",
            mentions: &mentions,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["chatId"], "120363@g.us");
        assert_eq!(json["text"], "@5511999 pong");
        assert_eq!(json["mentions"][0], "5511999@c.us");
    }

    #[tokio::test]
    async fn test_ingest_lifecycle() {
        let channel = BridgeChannel::new(config());
        let event = BridgeEvent {
            chat_id: "120363@g.us".into(),
            author_id: Some("5511@c.us".into()),
            author_name: None,
            body: "bom dia".into(),
            group_name: None,
        };
        assert!(!channel.ingest(event.clone()).await);

        let mut rx = channel.start().await.unwrap();
        assert!(channel.ingest(event.clone()).await);
        assert_eq!(rx.recv().await.unwrap().text, "bom dia");

        channel.stop().await.unwrap();
        assert!(!channel.ingest(event).await);
    }

    #[tokio::test]
    async fn test_start_requires_callback() {
        let channel = BridgeChannel::new(BridgeConfig::default());
        assert!(channel.start().await.is_err());
    }
}
