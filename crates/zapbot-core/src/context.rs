use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default number of turns remembered per chat.
pub const DEFAULT_CONTEXT_SIZE: usize = 5;

/// Conversation context passed to an AI provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Recent turns of the chat (oldest first).
    pub history: Vec<String>,
    /// The current user request.
    pub current_message: String,
    /// Override the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A structured message for API-based providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Context {
    /// Create a new context with just a current message and default system prompt.
    pub fn new(message: &str) -> Self {
        Self {
            system_prompt: default_system_prompt(),
            history: Vec::new(),
            current_message: message.to_string(),
            model: None,
        }
    }

    /// Context for a `/bot` query, carrying the chat's recent turns.
    pub fn for_query(query: &str, history: Vec<String>) -> Self {
        Self {
            history,
            ..Self::new(query)
        }
    }

    /// Convert context to structured API messages.
    ///
    /// Returns `(system_prompt, messages)`. Recent turns are folded into the
    /// single user message since the tracker does not record roles.
    pub fn to_api_messages(&self) -> (String, Vec<ApiMessage>) {
        let content = if self.history.is_empty() {
            self.current_message.clone()
        } else {
            format!(
                "Conversa recente:\n{}\n\nPedido: {}",
                self.history.join("\n"),
                self.current_message
            )
        };
        (
            self.system_prompt.clone(),
            vec![ApiMessage {
                role: "user".to_string(),
                content,
            }],
        )
    }
}

fn default_system_prompt() -> String {
    "Você é um amigo no Whatsapp. Apenas responda o seguinte comando de forma breve e útil, \
     sem interagir diretamente com os envolvidos, apenas cumpra o que foi pedido!"
        .to_string()
}

/// Short-term per-chat memory for the AI collaborator.
///
/// Keeps at most `capacity` entries per chat; the oldest entry is dropped
/// first. Nothing is persisted.
pub struct ContextTracker {
    capacity: usize,
    chats: Mutex<HashMap<String, VecDeque<String>>>,
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_SIZE)
    }
}

impl ContextTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            chats: Mutex::new(HashMap::new()),
        }
    }

    /// Append a turn to a chat's history.
    pub fn add_message(&self, chat_id: &str, message: &str) {
        let mut chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        let turns = chats.entry(chat_id.to_string()).or_default();
        turns.push_back(message.to_string());
        while turns.len() > self.capacity {
            turns.pop_front();
        }
    }

    /// Recent turns of a chat, oldest first. Empty for unknown chats.
    pub fn get_context(&self, chat_id: &str) -> Vec<String> {
        let chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        chats
            .get(chat_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget everything remembered for a chat.
    pub fn clear_context(&self, chat_id: &str) {
        let mut chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        chats.remove(chat_id);
    }
}
