//! Line and page markup.
//!
//! Lines and pages are stored as a small HTML subset so that serialized pages
//! and the persisted line cache survive restarts unchanged. The layout side
//! (`core-render`) understands exactly the tags produced here.

use std::borrow::Cow;

use core_model::{DisplayLine, PageNumber};

/// Token appended between lines; a collapsible break opportunity.
pub const SOFT_BREAK: &str = " ";
/// Break opportunity that is honored even inside `nowrap` spans.
pub const WORD_BREAK: &str = "<wbr>";

pub const CENTER_OPEN: &str = "<center>";
pub const CENTER_CLOSE: &str = "</center>";
pub const NOWRAP_OPEN: &str = r#"<span class="nowrap">"#;
pub const VISRAAM_MAIN_OPEN: &str = r#"<span class="visraam-main">"#;
pub const VISRAAM_SECONDARY_OPEN: &str = r#"<span class="visraam-yamki">"#;
pub const SPAN_CLOSE: &str = "</span>";

const SEPARATOR_PREFIX: &str = r#"<p class="page-separator" data-page=""#;
const SEPARATOR_SUFFIX: &str = r#""></p>"#;

/// Escape the three characters that would otherwise be read as markup.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

pub fn page_separator_markup(page: PageNumber) -> String {
    format!("{SEPARATOR_PREFIX}{page}{SEPARATOR_SUFFIX}")
}

/// Markup appended to the sizing surface and the serialized page for `line`.
pub fn line_markup(line: &DisplayLine) -> Cow<'_, str> {
    if line.is_page_separator {
        Cow::Owned(page_separator_markup(line.page_no))
    } else {
        Cow::Borrowed(line.text.as_str())
    }
}

/// Page numbers announced by separator markers, in document order.
pub fn separator_pages(markup: &str) -> impl Iterator<Item = PageNumber> + '_ {
    markup.match_indices(SEPARATOR_PREFIX).filter_map(|(at, _)| {
        let rest = &markup[at + SEPARATOR_PREFIX.len()..];
        let end = rest.find('"')?;
        rest[..end].parse().ok()
    })
}

/// Join lines into one page. Headings are blocks, so no break token is
/// placed next to them; the final line carries no trailing token.
pub fn serialize_page(lines: &[DisplayLine]) -> String {
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        out.push_str(&line_markup(line));
        if let Some(next) = lines.get(index + 1)
            && !line.is_heading
            && !next.is_heading
        {
            out.push_str(SOFT_BREAK);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str, is_heading: bool) -> DisplayLine {
        DisplayLine {
            text: text.into(),
            is_heading,
            is_page_separator: false,
            line_no: 1,
            page_no: 1,
            shabad_id: 1,
            verse_id: 1,
        }
    }

    #[test]
    fn escapes_only_when_needed() {
        assert!(matches!(escape_text("siq nwmu"), Cow::Borrowed(_)));
        assert_eq!(escape_text("<> a&b"), "&lt;&gt; a&amp;b");
    }

    #[test]
    fn separator_round_trips_page_number() {
        let markup = format!("a {} b", page_separator_markup(17));
        assert_eq!(separator_pages(&markup).collect::<Vec<_>>(), vec![17]);
    }

    #[test]
    fn no_break_token_next_to_headings() {
        let lines = [
            text("A", false),
            text("<center>H</center>", true),
            text("B", false),
            text("C", false),
        ];
        assert_eq!(serialize_page(&lines), "A<center>H</center>B C");
    }

    #[test]
    fn separators_join_like_text() {
        let lines = [text("A", false), DisplayLine::page_separator(2, 1), text("B", false)];
        assert_eq!(
            serialize_page(&lines),
            r#"A <p class="page-separator" data-page="2"></p> B"#
        );
    }
}
