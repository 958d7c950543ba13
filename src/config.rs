use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatPlatformKind {
    #[default]
    Discord,
    Telegram,
}

impl std::fmt::Display for ChatPlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatPlatformKind::Telegram => write!(f, "telegram"),
            ChatPlatformKind::Discord => write!(f, "discord"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default)]
    pub platform: ChatPlatformKind,
    #[serde(default = "default_bot_token")]
    pub bot_token: String,
    #[serde(default)]
    pub channel_id: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScannerConfig {
    /// Reader framing prefix stripped once from each scan
    #[serde(default)]
    pub leading_trim: String,
    /// Reader framing suffix stripped once from each scan
    #[serde(default)]
    pub trailing_trim: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
}

fn default_bot_token() -> String {
    "your_bot_token_here".to_string()
}

fn default_poll_timeout_ms() -> u64 {
    50
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            platform: ChatPlatformKind::default(),
            bot_token: default_bot_token(),
            channel_id: 0,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the config file if it exists, otherwise fall back to defaults.
    /// Everything here can also be changed at runtime from the Settings menu.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        warn!(
            "Config file {} not found, starting with defaults",
            path.display()
        );
        Ok(Self::default())
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.chat.platform, ChatPlatformKind::Discord);
        assert_eq!(config.chat.channel_id, 0);
        assert_eq!(config.chat.bot_token, "your_bot_token_here");
        assert!(config.scanner.leading_trim.is_empty());
        assert_eq!(config.ui.poll_timeout_ms, 50);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [chat]
            platform = "discord"
            bot_token = "abc.def"
            channel_id = 1234567890123

            [scanner]
            leading_trim = "\u0002"
            trailing_trim = "\u0003"

            [ui]
            poll_timeout_ms = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.chat.platform, ChatPlatformKind::Discord);
        assert_eq!(config.chat.bot_token, "abc.def");
        assert_eq!(config.chat.channel_id, 1234567890123);
        assert_eq!(config.scanner.leading_trim, "\u{2}");
        assert_eq!(config.scanner.trailing_trim, "\u{3}");
        assert_eq!(config.ui.poll_timeout_ms, 20);
    }

    #[test]
    fn test_negative_telegram_group_id() {
        let config =
            Config::parse("[chat]\nplatform = \"telegram\"\nchannel_id = -1001234567890\n")
                .unwrap();
        assert_eq!(config.chat.platform, ChatPlatformKind::Telegram);
        assert_eq!(config.chat.channel_id, -1001234567890);
    }

    #[test]
    fn test_unknown_platform_rejected() {
        assert!(Config::parse("[chat]\nplatform = \"irc\"\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_or_default(Path::new("/nonexistent/rfidbot.toml")).unwrap();
        assert_eq!(config.chat.platform, ChatPlatformKind::Discord);
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(ChatPlatformKind::Telegram.to_string(), "telegram");
        assert_eq!(ChatPlatformKind::Discord.to_string(), "discord");
    }
}
