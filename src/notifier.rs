use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::registry::UserRecord;
use crate::worker::{NotifyRequest, WorkerCommand};

/// Presence message posted when a badge is scanned
pub fn format_presence(record: &UserRecord) -> String {
    format!(
        "{} is at the space: {}",
        record.display_name, record.message_fragment
    )
}

/// UI-side handle to the chat worker. Sending never blocks; the outcome comes
/// back later as a worker event.
#[derive(Debug, Clone)]
pub struct Notifier {
    commands: UnboundedSender<WorkerCommand>,
}

impl Notifier {
    pub fn new(commands: UnboundedSender<WorkerCommand>) -> Self {
        Self { commands }
    }

    pub fn send(&self, record: &UserRecord, channel_id: i64) -> Result<()> {
        let text = format_presence(record);
        debug!("Queueing notification for {}: {}", record.badge_id, text);
        self.commands
            .send(WorkerCommand::Notify(NotifyRequest {
                badge_id: record.badge_id.clone(),
                channel_id,
                text,
            }))
            .ok()
            .context("Chat worker is not running")
    }

    pub fn reconnect(&self, token: &str) -> Result<()> {
        self.commands
            .send(WorkerCommand::Reconnect {
                token: token.to_string(),
            })
            .ok()
            .context("Chat worker is not running")
    }
}
