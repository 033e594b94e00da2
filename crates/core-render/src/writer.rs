//! Terminal writer.
//!
//! Paint commands are collected for one frame and queued to the output in
//! order with a single flush at the end.
//!
//! Design invariants:
//! * Commands preserve ordering; no flushing mid-frame.
//! * All positions are absolute (0,0) origin; caller ensures bounds.
//! * Writer owns no global state; it is a short-lived object per frame.

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::Write;

use crate::frame::Frame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    ClearAll,
    Colors { fg: Color, bg: Color },
    Print(String),
    Reset,
}

#[derive(Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn clear_all(&mut self) {
        self.cmds.push(Command::ClearAll);
    }

    pub fn colors(&mut self, fg: Color, bg: Color) {
        self.cmds.push(Command::Colors { fg, bg });
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if s.is_empty() {
            return;
        }
        // consecutive prints under the same colours batch into one command
        if let Some(Command::Print(last)) = self.cmds.last_mut() {
            last.push_str(&s);
        } else {
            self.cmds.push(Command::Print(s));
        }
    }

    /// Queue a whole frame row by row; colour changes only where the
    /// foreground changes.
    pub fn frame(&mut self, frame: &Frame, default_fg: Color, bg: Color) {
        self.colors(default_fg, bg);
        self.clear_all();
        for y in 0..frame.height {
            self.move_to(0, y);
            let mut current = default_fg;
            for (cluster, _, fg, _) in frame.row_leaders(y) {
                let fg = fg.unwrap_or(default_fg);
                if fg != current {
                    self.colors(fg, bg);
                    current = fg;
                }
                self.print(cluster);
            }
            if current != default_fg {
                self.colors(default_fg, bg);
            }
        }
        self.cmds.push(Command::Reset);
    }

    pub fn flush_to<W: Write>(self, out: &mut W) -> Result<()> {
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => queue!(out, MoveTo(x, y))?,
                Command::ClearAll => queue!(out, Clear(ClearType::All))?,
                Command::Colors { fg, bg } => {
                    queue!(out, SetForegroundColor(fg), SetBackgroundColor(bg))?
                }
                Command::Print(s) => queue!(out, Print(s))?,
                Command::Reset => queue!(out, ResetColor)?,
            }
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_batch_between_colour_changes() {
        let mut frame = Frame::new(3, 1);
        frame.put_str(0, 0, "ab", None);
        frame.put_str(2, 0, "c", Some(Color::Blue));
        let mut w = Writer::new();
        w.frame(&frame, Color::White, Color::Black);
        let prints: Vec<_> = w
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Print(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(prints, vec!["ab", "c"]);
    }

    #[test]
    fn flush_writes_escape_sequences() {
        let mut w = Writer::new();
        w.move_to(0, 0);
        w.print("x");
        let mut out = Vec::new();
        w.flush_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('x'));
        assert!(text.contains("\x1b["));
    }
}
