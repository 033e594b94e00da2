//! Status row composition.
//!
//! Two-stage pipeline as for every other painted element:
//! 1. `compose_status` produces an ordered vector of `StatusSegment` items.
//! 2. `format_status` renders those segments into the final string.
//!
//! Format: `<source> · page N[ · loading][ · message]`, or the go-to prompt
//! `Go to page: <digits>` while it is open. The prompt replaces everything
//! else so the typed digits are never truncated away.

use core_model::{PageNumber, SourceId};
use core_text::truncate_to_width;

pub struct StatusContext<'a> {
    pub source: SourceId,
    pub page: Option<PageNumber>,
    pub loading: bool,
    pub prompt: Option<&'a str>,
    pub message: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Source(&'static str),
    Page(PageNumber),
    Loading,
    Message(&'a str),
    Prompt(&'a str),
}

pub fn compose_status<'a>(ctx: &StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    if let Some(prompt) = ctx.prompt {
        return vec![StatusSegment::Prompt(prompt)];
    }
    let mut out = Vec::with_capacity(4);
    out.push(StatusSegment::Source(ctx.source.title()));
    if let Some(page) = ctx.page {
        out.push(StatusSegment::Page(page));
    }
    if ctx.loading {
        out.push(StatusSegment::Loading);
    }
    if let Some(message) = ctx.message {
        out.push(StatusSegment::Message(message));
    }
    out
}

pub fn format_status(segments: &[StatusSegment<'_>]) -> String {
    let mut s = String::with_capacity(48);
    for (index, seg) in segments.iter().enumerate() {
        if index > 0 {
            s.push_str(" · ");
        }
        match seg {
            StatusSegment::Source(title) => s.push_str(title),
            StatusSegment::Page(page) => {
                s.push_str("page ");
                s.push_str(&page.to_string());
            }
            StatusSegment::Loading => s.push_str("loading"),
            StatusSegment::Message(message) => s.push_str(message),
            StatusSegment::Prompt(digits) => {
                s.push_str("Go to page: ");
                s.push_str(digits);
            }
        }
    }
    s
}

/// Status string clipped to `width` cells.
pub fn build_status_line(ctx: &StatusContext<'_>, width: u16) -> String {
    let full = format_status(&compose_status(ctx));
    truncate_to_width(&full, width).to_string()
}
