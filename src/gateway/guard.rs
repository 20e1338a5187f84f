//! Input validation and per-user rate limiting for AI queries.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use zapbot_core::config::LimitsConfig;

pub const BLOCKED_USER: &str = "Usuário bloqueado.";
pub const CHAT_NOT_ALLOWED: &str = "Chat não autorizado.";
pub const MESSAGE_TOO_LONG: &str = "Mensagem muito longa.";

/// Check a message against the block list, the chat allowlist and the size
/// limit, in that order. Empty lists restrict nothing.
pub fn validate_message(
    body: &str,
    user_id: &str,
    chat_id: &str,
    limits: &LimitsConfig,
) -> Result<(), &'static str> {
    if limits.blocked_users.iter().any(|u| u == user_id) {
        return Err(BLOCKED_USER);
    }
    if !limits.allowed_chats.is_empty() && !limits.allowed_chats.iter().any(|c| c == chat_id) {
        return Err(CHAT_NOT_ALLOWED);
    }
    if body.chars().count() > limits.max_message_length {
        return Err(MESSAGE_TOO_LONG);
    }
    Ok(())
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window rate limiter keyed by user id.
///
/// A user's first action opens a window; up to `max` actions are allowed
/// until the window elapses, then the count starts over.
pub struct RateLimiter {
    window: Duration,
    max: u32,
    users: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max: max.max(1),
            users: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(limits: &LimitsConfig) -> Self {
        Self::new(
            Duration::from_secs(limits.rate_limit_window_secs),
            limits.rate_limit_max,
        )
    }

    /// Count one action for `user_id`. Returns `false` when over the limit.
    pub fn check(&self, user_id: &str) -> bool {
        self.check_at(user_id, Instant::now())
    }

    pub fn check_at(&self, user_id: &str, now: Instant) -> bool {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        match users.get_mut(user_id) {
            Some(w) if now.duration_since(w.started) < self.window => {
                if w.count >= self.max {
                    return false;
                }
                w.count += 1;
                true
            }
            _ => {
                users.insert(
                    user_id.to_string(),
                    Window {
                        started: now,
                        count: 1,
                    },
                );
                true
            }
        }
    }

    /// Whole seconds until the user's window resets, rounded up. 0 for
    /// unknown users and elapsed windows.
    pub fn time_until_reset(&self, user_id: &str) -> u64 {
        self.time_until_reset_at(user_id, Instant::now())
    }

    pub fn time_until_reset_at(&self, user_id: &str, now: Instant) -> u64 {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        let Some(w) = users.get(user_id) else {
            return 0;
        };
        let left = self.window.saturating_sub(now.duration_since(w.started));
        left.as_millis().div_ceil(1000) as u64
    }
}
