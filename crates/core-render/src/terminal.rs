//! Terminal session: raw mode, alternate screen, hidden cursor.
//!
//! Opening a session switches the terminal into reader mode; closing or
//! dropping it restores the previous state. Dropping covers early returns and
//! unwinding panics.

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::stdout;
use tracing::{debug, warn};

/// Current terminal size as (columns, rows).
pub fn terminal_size() -> Result<(u16, u16)> {
    crossterm::terminal::size().context("query terminal size")
}

#[derive(Debug)]
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub fn open(title: &str) -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        if let Err(err) = execute!(stdout(), EnterAlternateScreen, Hide, SetTitle(title)) {
            let _ = disable_raw_mode();
            return Err(err).context("enter alternate screen");
        }
        debug!(target: "render.terminal", title, "session_opened");
        Ok(Self { active: true })
    }

    /// Restore the terminal, reporting failures instead of swallowing them.
    pub fn close(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if !std::mem::take(&mut self.active) {
            return Ok(());
        }
        let screen = execute!(stdout(), LeaveAlternateScreen, Show);
        let raw = disable_raw_mode();
        debug!(target: "render.terminal", "session_closed");
        screen.context("leave alternate screen")?;
        raw.context("disable raw mode")
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(target: "render.terminal", error = %format!("{err:#}"), "restore_failed");
        }
    }
}
