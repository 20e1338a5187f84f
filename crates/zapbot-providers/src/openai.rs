//! OpenAI-compatible chat completion provider.
//!
//! Works with OpenAI's API and any endpoint speaking the same protocol.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};
use zapbot_core::{
    config::OpenAiConfig,
    context::{ApiMessage, Context},
    error::ZapError,
    message::{MessageMetadata, OutgoingMessage},
    traits::Provider,
};

/// Reply used when the API answers without any choice.
pub const EMPTY_COMPLETION: &str = "❌ Não consegui gerar uma resposta.";

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn from_config(config: &OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// System prompt as its own message, followed by the conversation.
fn build_messages(system: &str, api_messages: &[ApiMessage]) -> Vec<ChatMessage> {
    let system = (!system.is_empty()).then(|| ChatMessage {
        role: "system".to_string(),
        content: system.to_string(),
    });
    system
        .into_iter()
        .chain(api_messages.iter().map(|m| ChatMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        }))
        .collect()
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
    model: Option<String>,
    usage: Option<ChatUsage>,
}

impl ChatCompletionResponse {
    fn first_text(&self) -> Option<String> {
        self.choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

/// Map a non-success HTTP status to the matching error kind.
fn status_error(status: StatusCode, body: &str) -> ZapError {
    let detail = format!("openai returned {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS {
        ZapError::RateLimited(detail)
    } else {
        ZapError::Provider(detail)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, ZapError> {
        let (system, api_messages) = context.to_api_messages();
        let model = context.model.as_deref().unwrap_or(&self.model);
        let start = Instant::now();

        let body = ChatCompletionRequest {
            model: model.to_string(),
            messages: build_messages(&system, &api_messages),
            temperature: self.temperature,
        };

        let url = self.endpoint("chat/completions");
        debug!("openai: POST {url} model={model}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ZapError::Provider(format!("openai request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| ZapError::Provider(format!("openai: failed to parse response: {e}")))?;

        let text = parsed
            .first_text()
            .unwrap_or_else(|| EMPTY_COMPLETION.to_string());

        Ok(OutgoingMessage {
            text,
            metadata: MessageMetadata {
                provider_used: "openai".to_string(),
                tokens_used: parsed.usage.as_ref().and_then(|u| u.total_tokens),
                processing_time_ms: start.elapsed().as_millis() as u64,
                model: parsed.model,
            },
            ..Default::default()
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        match self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}
