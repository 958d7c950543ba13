use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error};

use crate::app::{App, Control};
use crate::ui;
use crate::worker::WorkerEvent;

/// Owns the terminal for the lifetime of the UI and restores it on drop
pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    poll_timeout: Duration,
}

impl Tui {
    pub fn new(poll_timeout: Duration) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let terminal = undo_on_error(
            || {
                let mut stdout = io::stdout();
                execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
                let backend = CrosstermBackend::new(stdout);
                Terminal::new(backend).context("Failed to create terminal")
            },
            || {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                if let Err(e) = disable_raw_mode() {
                    error!("Failed to disable raw mode: {}", e);
                }
            },
        )?;

        Ok(Self {
            terminal,
            poll_timeout,
        })
    }

    /// UI loop: apply worker events, redraw, then handle every pending key.
    /// Wedge readers type a whole badge in one burst, so keys are drained
    /// before the next frame.
    pub fn run(&mut self, app: &mut App, events: &mut UnboundedReceiver<WorkerEvent>) -> Result<()> {
        loop {
            while let Ok(worker_event) = events.try_recv() {
                debug!("Worker event: {:?}", worker_event);
                app.handle_worker_event(worker_event);
            }

            self.terminal
                .draw(|frame| ui::render(frame, app))
                .context("Failed to draw frame")?;

            let mut timeout = self.poll_timeout;
            while event::poll(timeout)? {
                timeout = Duration::ZERO;
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) == Control::Quit {
                    return Ok(());
                }
            }
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            error!("Failed to disable raw mode: {}", e);
        }
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            error!("Failed to leave alternate screen: {}", e);
        }
        let _ = self.terminal.show_cursor();
    }
}

/// Run `setup`; if it fails, run `undo` before handing back the error.
/// Covers the window where raw mode is on but no `Tui` exists to drop.
fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    let result = setup();
    if result.is_err() {
        undo();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_failed_setup_is_undone() {
        let undone = Cell::new(false);
        let result: Result<()> = undo_on_error(
            || anyhow::bail!("alternate screen unsupported"),
            || undone.set(true),
        );

        assert!(result.unwrap_err().to_string().contains("unsupported"));
        assert!(undone.get());
    }

    #[test]
    fn test_successful_setup_is_kept() {
        let undone = Cell::new(false);
        let value = undo_on_error(|| Ok(7), || undone.set(true)).unwrap();

        assert_eq!(value, 7);
        assert!(!undone.get());
    }
}
