//! Shared utilities for channel implementations.

/// Maximum characters WhatsApp accepts in one text message.
pub const WHATSAPP_MAX_CHARS: usize = 4096;

/// Split a long message into chunks of at most `max_chars` characters.
///
/// Boundaries fall on char boundaries, so multi-byte text (accents, emoji)
/// is never cut mid-character. A newline inside the window is preferred as
/// the break point.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let break_at = if end < rest.len() {
            rest[..end].rfind('\n').map(|i| i + 1).unwrap_or(end)
        } else {
            end
        };
        let (chunk, tail) = rest.split_at(break_at);
        chunks.push(chunk);
        rest = tail;
    }

    chunks
}

/// Local part of a WhatsApp id: `5511999887766@c.us` → `5511999887766`.
pub fn user_number(id: &str) -> &str {
    id.split('@').next().unwrap_or(id)
}
