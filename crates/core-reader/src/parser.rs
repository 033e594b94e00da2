//! Raw verse → display line.
//!
//! The only state carried between lines is the id of the last shabad seen
//! ([`ShabadCursor`]). It decides whether a line opens a new centered block
//! and is reset to the invalid sentinel on a page jump.

use std::collections::BTreeMap;
use std::sync::Arc;

use core_model::{DisplayLine, RawLine, ShabadId, SourceId, VisraamKind};
use tracing::trace;

use crate::continuity::ContinuityRule;
use crate::markup::{
    CENTER_CLOSE, CENTER_OPEN, NOWRAP_OPEN, SPAN_CLOSE, VISRAAM_MAIN_OPEN, VISRAAM_SECONDARY_OPEN,
    WORD_BREAK, escape_text,
};

/// Ik Onkar in the ASCII font encoding and in Unicode.
pub const HEADING_MARKERS: [&str; 2] = ["<>", "ੴ"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShabadCursor {
    last: Option<ShabadId>,
}

impl ShabadCursor {
    pub const fn new(last: Option<ShabadId>) -> Self {
        Self { last }
    }

    pub const fn last(&self) -> Option<ShabadId> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub fn is_hard_heading(text: &str) -> bool {
    HEADING_MARKERS.iter().any(|marker| text.starts_with(marker))
}

/// Parse one raw line, advancing `cursor` to the line's shabad id.
pub fn parse_line(
    raw: &RawLine,
    cursor: &mut ShabadCursor,
    source: SourceId,
    rule: &dyn ContinuityRule,
) -> DisplayLine {
    let hard_heading = is_hard_heading(&raw.text);
    let new_group = cursor.last != Some(raw.shabad_id)
        && !rule.is_continuous(cursor.last, raw.shabad_id, source);
    let is_heading = hard_heading || new_group;

    let body = annotate_words(raw);
    let text = if is_heading {
        format!("{CENTER_OPEN}{body}{CENTER_CLOSE}")
    } else {
        format!("{NOWRAP_OPEN}{body}{SPAN_CLOSE}")
    };

    trace!(
        target: "reader.parse",
        verse_id = raw.verse_id,
        shabad_id = raw.shabad_id,
        previous = ?cursor.last,
        is_heading,
        marks = raw.visraam.len(),
        "line_parsed"
    );
    cursor.last = Some(raw.shabad_id);

    DisplayLine {
        text,
        is_heading,
        is_page_separator: false,
        line_no: raw.line_no,
        page_no: raw.page_no,
        shabad_id: raw.shabad_id,
        verse_id: raw.verse_id,
    }
}

// Marks address words by their index after splitting on single spaces, so
// consecutive spaces yield empty words and keep later indices aligned.
fn annotate_words(raw: &RawLine) -> String {
    let marks: BTreeMap<usize, VisraamKind> = raw
        .visraam
        .iter()
        .map(|mark| (mark.position, mark.kind))
        .collect();

    raw.text
        .split(' ')
        .enumerate()
        .map(|(index, word)| {
            let word = escape_text(word);
            match marks.get(&index) {
                Some(VisraamKind::Main) => {
                    format!("{VISRAAM_MAIN_OPEN}{word}{SPAN_CLOSE}{WORD_BREAK}")
                }
                Some(VisraamKind::Secondary) => {
                    format!("{VISRAAM_SECONDARY_OPEN}{word}{SPAN_CLOSE}")
                }
                None => word.into_owned(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parser with its cursor and continuity rule bound for one source.
#[derive(Clone)]
pub struct LineParser {
    source: SourceId,
    rule: Arc<dyn ContinuityRule>,
    cursor: ShabadCursor,
}

impl LineParser {
    pub fn new(source: SourceId, rule: Arc<dyn ContinuityRule>) -> Self {
        Self {
            source,
            rule,
            cursor: ShabadCursor::default(),
        }
    }

    pub fn parse(&mut self, raw: &RawLine) -> DisplayLine {
        parse_line(raw, &mut self.cursor, self.source, self.rule.as_ref())
    }

    pub fn cursor(&self) -> ShabadCursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: ShabadCursor) {
        self.cursor = cursor;
    }

    pub fn reset(&mut self) {
        self.cursor.reset();
    }
}

impl std::fmt::Debug for LineParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineParser")
            .field("source", &self.source)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
