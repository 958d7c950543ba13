//! Background chat worker.
//!
//! Owns the tokio runtime and the live chat client on its own thread. The UI
//! thread talks to it only through [`WorkerCommand`]s, and it reports back
//! only through [`WorkerEvent`]s, which the UI renders on its own thread.

use std::thread::JoinHandle;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use crate::platform::ChatPlatform;

/// A presence message ready to post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    pub badge_id: String,
    pub channel_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    Notify(NotifyRequest),
    /// Token changed in settings; drop the old client and log in again
    Reconnect { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Ready { identity: String },
    ConnectFailed { error: String },
    Delivered { badge_id: String, channel_id: i64 },
    DeliveryFailed { badge_id: String, error: String },
}

/// Builds a platform client from a bot token
pub type PlatformFactory = Box<dyn Fn(&str) -> Box<dyn ChatPlatform> + Send>;

/// Start the worker thread. It runs until `commands` is closed.
pub fn spawn(
    factory: PlatformFactory,
    token: String,
    commands: UnboundedReceiver<WorkerCommand>,
    events: UnboundedSender<WorkerEvent>,
) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("chat-worker".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start worker runtime: {}", e);
                    let _ = events.send(WorkerEvent::ConnectFailed {
                        error: e.to_string(),
                    });
                    return;
                }
            };
            runtime.block_on(run(factory, token, commands, events));
        })
        .context("Failed to spawn chat worker thread")
}

/// Worker loop: log in once, then serve commands until the UI hangs up
pub async fn run(
    factory: PlatformFactory,
    token: String,
    mut commands: UnboundedReceiver<WorkerCommand>,
    events: UnboundedSender<WorkerEvent>,
) {
    let mut client = login(factory(&token), &events).await;

    while let Some(command) = commands.recv().await {
        match command {
            WorkerCommand::Notify(request) => {
                let event = deliver(client.as_deref(), request).await;
                if events.send(event).is_err() {
                    break;
                }
            }
            WorkerCommand::Reconnect { token } => {
                info!("Reconnecting with new bot token");
                client = login(factory(&token), &events).await;
            }
        }
    }

    info!("Chat worker stopped");
}

async fn login(
    platform: Box<dyn ChatPlatform>,
    events: &UnboundedSender<WorkerEvent>,
) -> Option<Box<dyn ChatPlatform>> {
    info!("Connecting to {}...", platform.name());
    match platform.connect().await {
        Ok(identity) => {
            info!("Bot logged in as {}", identity);
            let _ = events.send(WorkerEvent::Ready { identity });
            Some(platform)
        }
        Err(e) => {
            error!("Failed to connect to {}: {:#}", platform.name(), e);
            let _ = events.send(WorkerEvent::ConnectFailed {
                error: format!("{:#}", e),
            });
            None
        }
    }
}

async fn deliver(client: Option<&dyn ChatPlatform>, request: NotifyRequest) -> WorkerEvent {
    let NotifyRequest {
        badge_id,
        channel_id,
        text,
    } = request;

    let Some(client) = client else {
        warn!("Dropping notification for {}: bot is not connected", badge_id);
        return WorkerEvent::DeliveryFailed {
            badge_id,
            error: "bot is not connected".to_string(),
        };
    };

    match client.send_message(channel_id, &text).await {
        Ok(()) => {
            info!("Delivered notification for {} to {}", badge_id, channel_id);
            WorkerEvent::Delivered {
                badge_id,
                channel_id,
            }
        }
        Err(e) => {
            warn!("Delivery failed for {}: {:#}", badge_id, e);
            WorkerEvent::DeliveryFailed {
                badge_id,
                error: format!("{:#}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    type Sent = Arc<Mutex<Vec<(String, i64, String)>>>;

    /// Accepts the token "good", knows channel 1 only
    struct FakePlatform {
        token: String,
        sent: Sent,
    }

    #[async_trait]
    impl ChatPlatform for FakePlatform {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn connect(&self) -> Result<String> {
            if self.token == "good" {
                Ok("fakebot".to_string())
            } else {
                anyhow::bail!("401 Unauthorized")
            }
        }

        async fn send_message(&self, channel_id: i64, text: &str) -> Result<()> {
            if channel_id != 1 {
                anyhow::bail!("Channel {} not found", channel_id);
            }
            self.sent
                .lock()
                .unwrap()
                .push((self.token.clone(), channel_id, text.to_string()));
            Ok(())
        }
    }

    fn factory(sent: Sent) -> PlatformFactory {
        Box::new(move |token: &str| {
            Box::new(FakePlatform {
                token: token.to_string(),
                sent: sent.clone(),
            }) as Box<dyn ChatPlatform>
        })
    }

    fn notify(badge_id: &str, channel_id: i64) -> WorkerCommand {
        WorkerCommand::Notify(NotifyRequest {
            badge_id: badge_id.to_string(),
            channel_id,
            text: format!("{} is at the space: hi", badge_id),
        })
    }

    async fn run_with(token: &str, commands: Vec<WorkerCommand>) -> (Vec<WorkerEvent>, Sent) {
        let sent: Sent = Arc::default();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        for command in commands {
            cmd_tx.send(command).unwrap();
        }
        drop(cmd_tx);

        run(factory(sent.clone()), token.to_string(), cmd_rx, event_tx).await;

        let mut events = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            events.push(event);
        }
        (events, sent)
    }

    #[tokio::test]
    async fn test_ready_then_delivered() {
        let (events, sent) = run_with("good", vec![notify("42", 1)]).await;

        assert_eq!(
            events,
            vec![
                WorkerEvent::Ready {
                    identity: "fakebot".to_string()
                },
                WorkerEvent::Delivered {
                    badge_id: "42".to_string(),
                    channel_id: 1
                },
            ]
        );
        assert_eq!(sent.lock().unwrap().len(), 1);
        assert_eq!(sent.lock().unwrap()[0].2, "42 is at the space: hi");
    }

    #[tokio::test]
    async fn test_unknown_channel_reports_failure() {
        let (events, sent) = run_with("good", vec![notify("42", 9)]).await;

        assert!(matches!(
            &events[1],
            WorkerEvent::DeliveryFailed { badge_id, error }
                if badge_id == "42" && error.contains("not found")
        ));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_token_then_reconnect() {
        let (events, sent) = run_with(
            "bad",
            vec![
                notify("1", 1),
                WorkerCommand::Reconnect {
                    token: "good".to_string(),
                },
                notify("2", 1),
            ],
        )
        .await;

        assert!(matches!(&events[0], WorkerEvent::ConnectFailed { error } if error.contains("401")));
        assert!(matches!(
            &events[1],
            WorkerEvent::DeliveryFailed { error, .. } if error == "bot is not connected"
        ));
        assert!(matches!(&events[2], WorkerEvent::Ready { .. }));
        assert!(matches!(&events[3], WorkerEvent::Delivered { badge_id, .. } if badge_id == "2"));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "good");
    }

    #[test]
    fn test_spawned_worker_stops_when_ui_hangs_up() {
        let sent: Sent = Arc::default();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let handle = spawn(factory(sent.clone()), "good".to_string(), cmd_rx, event_tx).unwrap();
        cmd_tx.send(notify("7", 1)).unwrap();
        drop(cmd_tx);
        handle.join().unwrap();

        assert!(matches!(event_rx.try_recv(), Ok(WorkerEvent::Ready { .. })));
        assert!(matches!(event_rx.try_recv(), Ok(WorkerEvent::Delivered { .. })));
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
