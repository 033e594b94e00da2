//! Paint laid-out pages into a [`Frame`].

use core_reader::{DisplayModes, Viewport};
use crossterm::style::Color;

use crate::flow::{FlowLayout, Row};
use crate::frame::Frame;
use crate::markup::SpanFlags;
use crate::theme::Theme;

/// Where the text area of a page sits inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArea {
    pub x: u16,
    pub y: u16,
    pub viewport: Viewport,
}

fn run_color(flags: SpanFlags, modes: DisplayModes, theme: &Theme) -> Color {
    if modes.show_visraam && flags.contains(SpanFlags::VISRAAM_MAIN) {
        theme.visraam_main
    } else if modes.show_visraam && flags.contains(SpanFlags::VISRAAM_SECONDARY) {
        theme.visraam_secondary
    } else {
        theme.text
    }
}

fn row_start(area: PageArea, row: &Row) -> u16 {
    let offset = if row.centered {
        area.viewport.width.saturating_sub(row.width) / 2
    } else {
        0
    };
    area.x.saturating_add(offset)
}

/// Lay `markup` out in the page area and paint it. Rows past the viewport
/// height are not painted; page numbers go to the right edge of the frame.
pub fn paint_page(frame: &mut Frame, area: PageArea, markup: &str, modes: DisplayModes, theme: &Theme) {
    if modes.hidden {
        return;
    }
    let layout = FlowLayout::layout(markup, area.viewport.width);
    for (index, row) in layout.rows.iter().enumerate().take(area.viewport.height as usize) {
        let y = area.y.saturating_add(index as u16);
        let mut x = row_start(area, row);
        for run in &row.runs {
            x = frame.put_str(x, y, &run.text, Some(run_color(run.flags, modes, theme)));
        }
        if modes.show_page_number
            && let Some(page) = row.markers.last()
        {
            let label = page.to_string();
            let label_x = frame.width.saturating_sub(label.len() as u16);
            frame.put_str(label_x, y, &label, Some(theme.visraam_secondary));
        }
    }
}

/// Paint a centered message in place of page content.
pub fn paint_banner(frame: &mut Frame, area: PageArea, text: &str, theme: &Theme) {
    let layout = FlowLayout::layout(text, area.viewport.width);
    let top = area.viewport.height.saturating_sub(layout.height()) / 2;
    for (index, row) in layout.rows.iter().enumerate().take(area.viewport.height as usize) {
        let y = area.y.saturating_add(top).saturating_add(index as u16);
        let x = area
            .x
            .saturating_add(area.viewport.width.saturating_sub(row.width) / 2);
        frame.put_str(x, y, &row.text(), Some(theme.text));
    }
}

/// Key bindings listed by the help overlay.
pub const HELP_LINES: &[&str] = &[
    "next page: Space Right Down PgDn",
    "previous page: Left Up PgUp",
    "go to page: g, digits, Enter",
    "visraam colours: v",
    "page numbers: p",
    "help: h",
    "quit: q",
];

/// Paint the key binding list centered in the page area.
pub fn paint_help(frame: &mut Frame, area: PageArea, theme: &Theme) {
    let markup: String = HELP_LINES
        .iter()
        .map(|line| format!("<center>{line}</center>"))
        .collect();
    paint_banner(frame, area, &markup, theme);
}
