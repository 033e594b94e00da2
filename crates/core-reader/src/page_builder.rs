//! Page building: pull lines until the sizing surface overflows.
//!
//! The builder appends one line at a time to a hidden [`LayoutSurface`] and
//! stops as soon as the rendered height exceeds the viewport or the line
//! source runs dry. Lines that belong to the next page go back to the front of
//! the line source:
//! * the line that overflowed, unless it is the only content on the page;
//! * a line opening a new shabad block at the very bottom.
//!
//! Separator markers at either edge of the page are dropped; inside the page
//! they stay as inline markers.
//!
//! A failed fetch aborts the build and returns every consumed line to the
//! cache, so calling [`PageBuilder::build_page`] again resumes cleanly.

use core_api::FetchError;
use core_model::DisplayLine;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::line_source::LineSource;
use crate::markup::{SOFT_BREAK, line_markup, serialize_page};
use crate::surface::{LayoutSurface, Viewport};

pub const UNSUPPORTED_BANNER: &str =
    "This terminal is too narrow to lay out the text. Widen the window or reduce the font size.";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("page build aborted: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    pub lines: Vec<DisplayLine>,
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Page(BuiltPage),
    EndOfContent,
    Unsupported,
}

pub struct PageBuilder {
    surface: Box<dyn LayoutSurface>,
    width_checked: bool,
}

impl PageBuilder {
    pub fn new(surface: Box<dyn LayoutSurface>) -> Self {
        Self {
            surface,
            width_checked: false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.surface.viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.set_viewport(viewport);
    }

    pub async fn build_page(&mut self, source: &mut LineSource) -> Result<BuildOutcome, BuildError> {
        let viewport = self.surface.viewport();
        self.surface.clear();

        let mut lines: Vec<DisplayLine> = Vec::new();
        let mut overflowed = false;
        loop {
            let line = match source.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!(target: "reader.build", consumed = lines.len(), "build_aborted");
                    source.restore_front(lines);
                    self.surface.clear();
                    return Err(err.into());
                }
            };
            self.surface.append(&line_markup(&line));
            self.surface.append(SOFT_BREAK);
            lines.push(line);
            if self.surface.rendered_height() > viewport.height {
                overflowed = true;
                break;
            }
        }

        if !self.width_checked {
            self.width_checked = true;
            let width = self.surface.rendered_width();
            if width > viewport.width {
                warn!(
                    target: "reader.build",
                    width,
                    viewport_width = viewport.width,
                    "unsupported_environment"
                );
                source.restore_front(lines);
                self.surface.clear();
                return Ok(BuildOutcome::Unsupported);
            }
        }
        self.surface.clear();

        if overflowed && has_content_before_last(&lines) {
            if let Some(line) = lines.pop() {
                source.push_front(line);
            }
        } else if overflowed {
            debug!(target: "reader.build", "oversized_line_kept");
        }
        if let Some(at) = orphaned_group_start(&lines) {
            let deferred = lines.split_off(at);
            debug!(
                target: "reader.build",
                shabad_id = deferred[0].shabad_id,
                deferred = deferred.len(),
                "orphan_deferred"
            );
            source.restore_front(deferred);
        }
        while lines.first().is_some_and(|line| line.is_page_separator) {
            lines.remove(0);
        }
        while lines.last().is_some_and(|line| line.is_page_separator) {
            lines.pop();
        }

        if lines.is_empty() {
            debug!(target: "reader.build", "end_of_content");
            return Ok(BuildOutcome::EndOfContent);
        }

        let markup = serialize_page(&lines);
        info!(
            target: "reader.build",
            lines = lines.len(),
            overflowed,
            next_page = source.next_page_to_fetch(),
            "page_built"
        );
        Ok(BuildOutcome::Page(BuiltPage { lines, markup }))
    }
}

fn has_content_before_last(lines: &[DisplayLine]) -> bool {
    lines
        .split_last()
        .is_some_and(|(_, rest)| rest.iter().any(|line| !line.is_page_separator))
}

// A heading that opens a new shabad as the final content line would sit alone
// at the bottom of the page. Returns the index of that heading; it and any
// separators after it move to the next page.
fn orphaned_group_start(lines: &[DisplayLine]) -> Option<usize> {
    let mut content = lines
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, line)| !line.is_page_separator);
    let (at, last) = content.next()?;
    let (_, previous) = content.next()?;
    last.starts_group_after(previous).then_some(at)
}

impl std::fmt::Debug for PageBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBuilder")
            .field("viewport", &self.surface.viewport())
            .field("width_checked", &self.width_checked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(shabad_id: u32, is_heading: bool) -> DisplayLine {
        DisplayLine {
            text: "x".into(),
            is_heading,
            is_page_separator: false,
            line_no: 1,
            page_no: 1,
            shabad_id,
            verse_id: 1,
        }
    }

    #[test]
    fn orphan_check_skips_separators() {
        let lines = [line(1, false), DisplayLine::page_separator(2, 1), line(2, true)];
        assert_eq!(orphaned_group_start(&lines), Some(2));
        let lines = [DisplayLine::page_separator(2, 1), line(2, true)];
        assert_eq!(orphaned_group_start(&lines), None);
    }

    #[test]
    fn orphan_check_looks_past_trailing_separator() {
        let lines = [line(1, false), line(2, true), DisplayLine::page_separator(3, 2)];
        assert_eq!(orphaned_group_start(&lines), Some(1));
        let lines = [line(1, false), line(1, false), DisplayLine::page_separator(3, 1)];
        assert_eq!(orphaned_group_start(&lines), None);
    }

    #[test]
    fn lone_oversized_line_has_no_content_before_it() {
        assert!(!has_content_before_last(&[line(1, false)]));
        assert!(!has_content_before_last(&[DisplayLine::page_separator(2, 1), line(1, false)]));
        assert!(has_content_before_last(&[line(1, false), line(1, false)]));
    }
}
