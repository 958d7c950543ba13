mod app;
mod config;
mod error;
mod notifier;
mod platform;
mod registry;
mod scanner;
mod settings;
mod tui;
mod ui;
mod worker;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;
use crate::notifier::Notifier;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "rfidbot")]
#[command(about = "Announce RFID badge scans in a chat channel", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, value_name = "FILE", default_value = "rfidbot.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("Failed to open log file {}", cli.log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rfidbot=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false),
        )
        .init();

    info!("Loading configuration from: {}", cli.config.display());
    let config = Config::load_or_default(&cli.config)?;

    info!("Configuration loaded successfully");
    info!("  Platform: {}", config.chat.platform);
    info!("  Channel: {}", config.chat.channel_id);

    let settings = Settings::from_config(&config);
    let platform_kind = config.chat.platform;

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    // Detached: quitting drops the command sender and the worker winds down
    // on its own, or is abandoned at process exit.
    let _worker = worker::spawn(
        Box::new(move |token: &str| platform::build(platform_kind, token)),
        settings.auth_token.clone(),
        cmd_rx,
        event_tx,
    )?;

    let mut app = App::new(settings, platform_kind.to_string(), Notifier::new(cmd_tx));
    let mut tui = tui::Tui::new(Duration::from_millis(config.ui.poll_timeout_ms))?;
    tui.run(&mut app, &mut event_rx)?;

    info!("Shutting down");
    Ok(())
}
