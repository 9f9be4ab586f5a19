//! Terminal lifecycle for the live table.
//!
//! The terminal is restored on normal exit, on `q`/`Ctrl+C`, and on panic.

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::render::{draw_dashboard, Dashboard};

/// Receives each freshly rendered dashboard.
pub trait DisplaySink {
    fn show(&mut self, dashboard: &Dashboard) -> Result<()>;
}

pub struct TerminalSink {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSink {
    /// Enables raw mode, enters the alternate screen and hides the cursor.
    ///
    /// Call [`install_panic_hook`] first so a panic still restores the terminal.
    pub fn setup() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let terminal = undo_on_error(
            || {
                let mut stdout = io::stdout();
                execute!(stdout, EnterAlternateScreen, Hide).context("Failed to enter alternate screen")?;
                Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
            },
            || {
                let _ = restore_terminal();
            },
        )?;
        Ok(Self { terminal })
    }
}

/// Runs `step`; if it fails, runs `undo` before returning the error.
fn undo_on_error<T>(step: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    let result = step();
    if result.is_err() {
        undo();
    }
    result
}

impl DisplaySink for TerminalSink {
    fn show(&mut self, dashboard: &Dashboard) -> Result<()> {
        // Full redraw: nothing from the previous frame is reused.
        self.terminal.clear().context("Failed to clear terminal")?;
        self.terminal
            .draw(|frame| draw_dashboard(frame, dashboard))
            .context("Failed to draw dashboard")?;
        Ok(())
    }
}

/// Leaves the alternate screen and raw mode. Safe to call more than once.
pub fn restore_terminal() -> Result<()> {
    execute!(io::stdout(), Show, LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Forwards terminal input until shutdown: quit keys cancel `shutdown`,
/// resize events wake the run loop.
///
/// Raw mode swallows SIGINT, so `Ctrl+C` arrives here as a key press.
pub async fn watch_terminal_events(shutdown: CancellationToken, wake: Arc<Notify>) {
    let mut events = EventStream::new();
    loop {
        let event = tokio::select! {
            () = shutdown.cancelled() => return,
            event = events.next() => event,
        };
        match event {
            Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || matches!(key.code, KeyCode::Char('q' | 'Q') | KeyCode::Esc) {
                    info!("Stop requested from keyboard");
                    shutdown.cancel();
                    return;
                }
            }
            Some(Ok(Event::Resize(..))) => wake.notify_one(),
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "Terminal input stream failed");
                return;
            }
            None => return,
        }
    }
}
