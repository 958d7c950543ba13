use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::debug;

use super::{split_message, ChatPlatform};

/// Telegram caps a message at 4096 chars
const MAX_MESSAGE_LEN: usize = 4000;

pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn connect(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .context("Telegram rejected the bot token")?;
        Ok(format!("@{}", me.username()))
    }

    async fn send_message(&self, channel_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            debug!("Sending {} chars to Telegram chat {}", chunk.len(), channel_id);
            self.bot
                .send_message(ChatId(channel_id), chunk)
                .await
                .with_context(|| format!("Failed to send to Telegram chat {}", channel_id))?;
        }
        Ok(())
    }
}
