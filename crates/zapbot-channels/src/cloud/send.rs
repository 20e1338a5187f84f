//! Outbound text messages with retry.

use super::CloudChannel;
use crate::utils::{split_message, WHATSAPP_MAX_CHARS};
use std::time::Duration;
use tracing::{error, warn};
use zapbot_core::error::ZapError;

/// Backoff between send attempts: 500ms, 1s, 2s.
pub(super) const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Graph API body for a text message.
pub(super) fn text_body(to: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": text },
    })
}

impl CloudChannel {
    /// Send a text message, split into 4096-character chunks.
    ///
    /// Returns the Graph API response of the last chunk.
    pub async fn send_text(&self, to: &str, text: &str) -> Result<serde_json::Value, ZapError> {
        let mut last = serde_json::Value::Null;
        for chunk in split_message(text, WHATSAPP_MAX_CHARS) {
            last = self.post_with_retry(&text_body(to, chunk)).await?;
        }
        Ok(last)
    }

    async fn post_with_retry(&self, body: &serde_json::Value) -> Result<serde_json::Value, ZapError> {
        let mut last_err = None;

        for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
            match self.post_once(body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let attempt_num = attempt + 1;
                    if attempt_num < RETRY_DELAYS_MS.len() {
                        warn!(
                            "cloud send attempt {attempt_num}/{} failed: {e}, retrying in {delay_ms}ms",
                            RETRY_DELAYS_MS.len()
                        );
                        tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    } else {
                        error!(
                            "cloud send attempt {attempt_num}/{} failed: {e}, giving up",
                            RETRY_DELAYS_MS.len()
                        );
                    }
                    last_err = Some(e);
                }
            }
        }

        Err(ZapError::Channel(format!(
            "cloud send failed after {} attempts: {}",
            RETRY_DELAYS_MS.len(),
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn post_once(&self, body: &serde_json::Value) -> Result<serde_json::Value, ZapError> {
        let resp = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.config.token)
            .json(body)
            .send()
            .await
            .map_err(|e| ZapError::Channel(format!("cloud request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ZapError::Channel(format!("graph api returned {status}: {text}")));
        }

        resp.json()
            .await
            .map_err(|e| ZapError::Channel(format!("cloud: failed to parse response: {e}")))
    }
}
