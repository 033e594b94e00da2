//! Inline flow layout in terminal cells.
//!
//! Rules:
//! * A space outside `nowrap` is a break opportunity; runs of spaces collapse
//!   to one and spaces at row edges are dropped.
//! * A space inside `nowrap` joins its neighbours into one unbreakable word.
//!   When such a word cannot fit even an empty row it falls back to breaking at
//!   those spaces.
//! * `<wbr>` is a break opportunity everywhere.
//! * `<center>` content starts on a fresh row, its rows are centered, and
//!   whatever follows starts on a fresh row again.
//! * A page separator behaves like a breaking space and marks the row it
//!   lands on.
//! * A single chunk wider than the row overflows; [`FlowLayout::width`] then
//!   exceeds the layout width.

use core_model::PageNumber;
use core_text::str_width;

use crate::markup::{SpanFlags, Token, tokenize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub flags: SpanFlags,
    pub width: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub runs: Vec<Run>,
    pub width: u16,
    pub centered: bool,
    /// Pages announced by separators that fell on this row.
    pub markers: Vec<PageNumber>,
}

impl Row {
    fn push(&mut self, text: &str, flags: SpanFlags, width: u16) {
        self.width = self.width.saturating_add(width);
        match self.runs.last_mut() {
            Some(run) if run.flags == flags => {
                run.text.push_str(text);
                run.width = run.width.saturating_add(width);
            }
            _ => self.runs.push(Run {
                text: text.to_string(),
                flags,
                width,
            }),
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowLayout {
    pub rows: Vec<Row>,
}

impl FlowLayout {
    pub fn layout(markup: &str, max_width: u16) -> Self {
        let mut flow = Flow::new(max_width);
        for token in tokenize(markup) {
            flow.token(token);
        }
        flow.finish()
    }

    pub fn height(&self) -> u16 {
        u16::try_from(self.rows.len()).unwrap_or(u16::MAX)
    }

    pub fn width(&self) -> u16 {
        self.rows.iter().map(|row| row.width).max().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct Chunk {
    pieces: Vec<(String, SpanFlags, u16)>,
    width: u16,
}

#[derive(Debug, Default)]
struct Word {
    chunks: Vec<Chunk>,
    leading_space: bool,
}

impl Word {
    fn has_content(&self) -> bool {
        self.chunks.iter().any(|chunk| chunk.width > 0)
    }

    fn push_text(&mut self, text: &str, flags: SpanFlags) {
        if self.chunks.is_empty() {
            self.chunks.push(Chunk::default());
        }
        if let Some(chunk) = self.chunks.last_mut() {
            let width = str_width(text);
            chunk.pieces.push((text.to_string(), flags, width));
            chunk.width = chunk.width.saturating_add(width);
        }
    }

    fn non_breaking_space(&mut self) {
        match self.chunks.last() {
            None => self.leading_space = true,
            Some(chunk) if chunk.width == 0 => {}
            Some(_) => self.chunks.push(Chunk::default()),
        }
    }
}

fn chunks_width(chunks: &[Chunk]) -> u16 {
    let gaps = chunks.len().saturating_sub(1) as u16;
    chunks
        .iter()
        .fold(gaps, |acc, chunk| acc.saturating_add(chunk.width))
}

struct Flow {
    max_width: u16,
    rows: Vec<Row>,
    stack: Vec<SpanFlags>,
    word: Word,
    centered: bool,
    force_new_row: bool,
    pending_space: bool,
    pending_markers: Vec<PageNumber>,
}

impl Flow {
    fn new(max_width: u16) -> Self {
        Self {
            max_width,
            rows: Vec::new(),
            stack: Vec::new(),
            word: Word::default(),
            centered: false,
            force_new_row: false,
            pending_space: false,
            pending_markers: Vec::new(),
        }
    }

    fn flags(&self) -> SpanFlags {
        self.stack
            .iter()
            .fold(SpanFlags::empty(), |acc, flags| acc | *flags)
    }

    fn token(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.text(&text),
            Token::SpanOpen(flags) => self.stack.push(flags),
            Token::SpanClose => {
                self.stack.pop();
            }
            Token::WordBreak => self.finish_word(),
            Token::CenterOpen | Token::CenterClose => {
                self.finish_word();
                self.centered = matches!(token, Token::CenterOpen);
                self.force_new_row = true;
                self.pending_space = false;
            }
            Token::Separator(page) => {
                self.finish_word();
                self.pending_space = true;
                match self.rows.last_mut() {
                    Some(row) if !self.force_new_row => row.markers.push(page),
                    _ => self.pending_markers.push(page),
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        let flags = self.flags();
        let nowrap = flags.contains(SpanFlags::NOWRAP);
        for (index, part) in text.split([' ', '\t', '\n', '\r']).enumerate() {
            if index > 0 {
                if nowrap {
                    self.word.non_breaking_space();
                } else {
                    self.finish_word();
                    self.pending_space = true;
                }
            }
            if !part.is_empty() {
                self.word.push_text(part, flags);
            }
        }
    }

    fn finish_word(&mut self) {
        let mut word = std::mem::take(&mut self.word);
        if !word.has_content() {
            self.pending_space |= word.leading_space;
            return;
        }
        let trailing_space = word.chunks.last().is_some_and(|chunk| chunk.width == 0);
        word.chunks.retain(|chunk| chunk.width > 0);
        let space_before = self.pending_space || word.leading_space;

        if chunks_width(&word.chunks) > self.max_width && word.chunks.len() > 1 {
            for (index, chunk) in word.chunks.into_iter().enumerate() {
                self.place(vec![chunk], index > 0 || space_before);
            }
        } else {
            self.place(word.chunks, space_before);
        }
        self.pending_space = trailing_space;
    }

    fn new_row(&mut self) {
        self.rows.push(Row {
            centered: self.centered,
            markers: std::mem::take(&mut self.pending_markers),
            ..Row::default()
        });
        self.force_new_row = false;
    }

    fn place(&mut self, chunks: Vec<Chunk>, space_before: bool) {
        if self.force_new_row || self.rows.is_empty() {
            self.new_row();
        }
        let width = chunks_width(&chunks);
        let current = self.rows.last().map_or(0, |row| row.width);
        let mut lead = u16::from(space_before && current > 0);
        if current > 0 && current.saturating_add(lead).saturating_add(width) > self.max_width {
            self.new_row();
            lead = 0;
        }
        let Some(row) = self.rows.last_mut() else {
            return;
        };
        if lead > 0 {
            row.push(" ", SpanFlags::empty(), 1);
        }
        for (index, chunk) in chunks.into_iter().enumerate() {
            if index > 0 {
                row.push(" ", SpanFlags::NOWRAP, 1);
            }
            for (text, flags, width) in chunk.pieces {
                row.push(&text, flags, width);
            }
        }
    }

    fn finish(mut self) -> FlowLayout {
        self.finish_word();
        if !self.pending_markers.is_empty()
            && let Some(row) = self.rows.last_mut()
        {
            row.markers.append(&mut self.pending_markers);
        }
        FlowLayout { rows: self.rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(layout: &FlowLayout) -> Vec<String> {
        layout.rows.iter().map(Row::text).collect()
    }

    #[test]
    fn breaking_spaces_wrap_and_collapse() {
        let layout = FlowLayout::layout("aa   bb cc", 5);
        assert_eq!(texts(&layout), vec!["aa bb", "cc"]);
        assert_eq!(layout.height(), 2);
        assert_eq!(layout.width(), 5);
    }

    #[test]
    fn nowrap_moves_whole_phrase() {
        let layout = FlowLayout::layout(r#"aa <span class="nowrap">b c</span>"#, 5);
        assert_eq!(texts(&layout), vec!["aa", "b c"]);
    }

    #[test]
    fn word_break_splits_nowrap() {
        let layout = FlowLayout::layout(
            r#"<span class="nowrap">aaa<wbr> bbb</span>"#,
            5,
        );
        assert_eq!(texts(&layout), vec!["aaa", "bbb"]);
        let wide = FlowLayout::layout(r#"<span class="nowrap">aaa<wbr> bbb</span>"#, 7);
        assert_eq!(texts(&wide), vec!["aaa bbb"]);
    }

    #[test]
    fn oversized_nowrap_falls_back_to_its_spaces() {
        let layout = FlowLayout::layout(r#"<span class="nowrap">aa bb cc</span>"#, 5);
        assert_eq!(texts(&layout), vec!["aa bb", "cc"]);
        assert!(layout.width() <= 5);
    }

    #[test]
    fn unbreakable_word_overflows_width() {
        let layout = FlowLayout::layout("abcdefgh", 5);
        assert_eq!(layout.height(), 1);
        assert_eq!(layout.width(), 8);
    }

    #[test]
    fn center_blocks_take_their_own_rows() {
        let layout = FlowLayout::layout("a<center>title</center> b c", 20);
        assert_eq!(texts(&layout), vec!["a", "title", "b c"]);
        assert!(!layout.rows[0].centered);
        assert!(layout.rows[1].centered);
        assert!(!layout.rows[2].centered);
    }

    #[test]
    fn separator_marks_row_without_height() {
        let markup = r#"a <p class="page-separator" data-page="3"></p> b"#;
        let layout = FlowLayout::layout(markup, 20);
        assert_eq!(texts(&layout), vec!["a b"]);
        assert_eq!(layout.rows[0].markers, vec![3]);

        let joined = FlowLayout::layout(r#"a<p class="page-separator" data-page="3"></p>b"#, 20);
        assert_eq!(texts(&joined), vec!["a b"]);
    }

    #[test]
    fn visraam_spans_keep_their_flags() {
        let layout = FlowLayout::layout(
            r#"<span class="nowrap"><span class="visraam-yamki">a</span> b</span>"#,
            20,
        );
        let runs = &layout.rows[0].runs;
        assert_eq!(runs[0].text, "a");
        assert!(runs[0].flags.contains(SpanFlags::VISRAAM_SECONDARY | SpanFlags::NOWRAP));
        assert_eq!(layout.rows[0].text(), "a b");
    }

    #[test]
    fn empty_markup_has_no_rows() {
        assert_eq!(FlowLayout::layout("", 10).height(), 0);
        assert_eq!(FlowLayout::layout("   ", 10).height(), 0);
    }
}
