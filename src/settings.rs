use tracing::info;

use crate::config::Config;
use crate::error::InputError;
use crate::scanner::TrimPolicy;

/// Runtime settings, seeded from the config file and edited from the
/// Settings menu. Never written back to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub auth_token: String,
    pub channel_id: i64,
    pub trim: TrimPolicy,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auth_token: config.chat.bot_token.clone(),
            channel_id: config.chat.channel_id,
            trim: TrimPolicy {
                leading: config.scanner.leading_trim.clone(),
                trailing: config.scanner.trailing_trim.clone(),
            },
        }
    }

    /// Replace token and channel together. The channel id must parse as an
    /// integer; on failure nothing changes.
    pub fn set_credentials(&mut self, token: &str, channel_id: &str) -> Result<(), InputError> {
        let channel_id = parse_channel_id(channel_id)?;
        self.auth_token = token.to_string();
        self.channel_id = channel_id;
        info!("Chat credentials updated (channel {})", channel_id);
        Ok(())
    }

    pub fn set_leading_trim(&mut self, chars: &str) {
        self.trim.leading = chars.to_string();
        info!("Leading trim set to {:?}", chars);
    }

    pub fn set_trailing_trim(&mut self, chars: &str) {
        self.trim.trailing = chars.to_string();
        info!("Trailing trim set to {:?}", chars);
    }
}

fn parse_channel_id(raw: &str) -> Result<i64, InputError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| InputError::InvalidChannelId(raw.to_string()))
}
