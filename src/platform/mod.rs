pub mod discord;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::ChatPlatformKind;

/// An authenticated connection to a chat service that can post to a channel
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Platform identifier (e.g., "telegram", "discord")
    fn name(&self) -> &'static str;

    /// Authenticate with the service and return the bot's display identity
    async fn connect(&self) -> Result<String>;

    /// Post plain text to the channel with the given numeric id
    async fn send_message(&self, channel_id: i64, text: &str) -> Result<()>;
}

/// Build a client for `kind` using the bot token
pub fn build(kind: ChatPlatformKind, token: &str) -> Box<dyn ChatPlatform> {
    match kind {
        ChatPlatformKind::Telegram => Box::new(telegram::TelegramPlatform::new(token)),
        ChatPlatformKind::Discord => Box::new(discord::DiscordPlatform::new(token)),
    }
}

/// Split long messages to fit the platform's per-message limit
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        // A limit narrower than one char still has to make progress
        if end == start {
            end += text[start..].chars().next().map_or(1, char::len_utf8);
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}
