//! Message processing pipeline: the `handle_message` flow.

use super::{validate_message, Gateway};
use crate::commands::{self, Command, CommandContext};
use tracing::{error, info, warn};
use zapbot_channels::utils::user_number;
use zapbot_core::{
    context::Context,
    error::ZapError,
    message::{IncomingMessage, OutgoingMessage},
};

pub const THINKING: &str = "🤖 Pensando...";
pub const AI_ERROR: &str = "❌ Houve um erro ao tentar pensar na resposta.";
pub const AI_QUOTA: &str = "⏳ A IA está sobrecarregada no momento. Tente novamente mais tarde.";

fn rate_limited(secs: u64) -> String {
    format!("⏳ Muitos comandos! Aguarde {secs} segundos para usar o /bot novamente.")
}

impl Gateway {
    /// Process a single incoming message through the full pipeline.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let text = incoming.text.trim();

        // --- 1. STATISTICS ---
        if incoming.is_group && !text.is_empty() {
            let user_name = incoming
                .sender_name
                .as_deref()
                .unwrap_or_else(|| user_number(&incoming.sender_id));
            let group_name = incoming.group_name.as_deref().unwrap_or(&incoming.chat_id);
            self.stats.record_message(
                &incoming.chat_id,
                &incoming.sender_id,
                user_name,
                &incoming.text,
                group_name,
            );
        }

        // --- 2-3. INSTANT COMMANDS ---
        if let Some(cmd) = Command::parse(text) {
            info!("[{}] {} ran {:?}", incoming.channel, incoming.sender_id, cmd);
            let reply = commands::handle(
                cmd,
                &CommandContext {
                    stats: &self.stats,
                    context: &self.context,
                    chat_id: &incoming.chat_id,
                    sender_id: &incoming.sender_id,
                    is_group: incoming.is_group,
                },
            );
            self.send_text(&incoming, &reply).await;
            return;
        }

        // --- 4. AI QUERY ---
        if let Some(query) = commands::parse_bot_query(text) {
            self.handle_bot(&incoming, query).await;
        }
    }

    async fn handle_bot(&self, incoming: &IncomingMessage, query: &str) {
        if query.is_empty() {
            self.send_text(incoming, commands::BOT_USAGE).await;
            return;
        }

        if let Err(reason) = validate_message(
            &incoming.text,
            &incoming.sender_id,
            &incoming.chat_id,
            &self.limits,
        ) {
            warn!("rejected /bot from {}: {reason}", incoming.sender_id);
            self.send_text(incoming, &format!("❌ {reason}")).await;
            return;
        }

        if !self.limiter.check(&incoming.sender_id) {
            let secs = self.limiter.time_until_reset(&incoming.sender_id);
            info!("rate limited {} for {secs}s", incoming.sender_id);
            self.send_text(incoming, &rate_limited(secs)).await;
            return;
        }

        self.send_text(incoming, THINKING).await;

        let context = Context::for_query(query, self.context.get_context(&incoming.chat_id));
        let answer = match self.provider.complete(&context).await {
            Ok(resp) => {
                info!(
                    "[{}] answered {} in {}ms",
                    self.provider.name(),
                    incoming.sender_id,
                    resp.metadata.processing_time_ms
                );
                self.context
                    .add_message(&incoming.chat_id, &format!("Usuário: {query}"));
                self.context
                    .add_message(&incoming.chat_id, &format!("Bot: {}", resp.text));
                resp.text
            }
            Err(ZapError::RateLimited(e)) => {
                warn!("provider rate limited: {e}");
                AI_QUOTA.to_string()
            }
            Err(e) => {
                error!("provider error: {e}");
                AI_ERROR.to_string()
            }
        };

        self.send(incoming, reply_for(incoming, &answer)).await;
    }
}

/// The answer as sent back; group replies mention the author.
fn reply_for(incoming: &IncomingMessage, answer: &str) -> OutgoingMessage {
    let mut msg = OutgoingMessage::text(&incoming.chat_id, answer);
    if incoming.is_group && incoming.sender_id != incoming.chat_id {
        msg.text = format!("@{} {answer}", user_number(&incoming.sender_id));
        msg.mentions = vec![incoming.sender_id.clone()];
    }
    msg
}
