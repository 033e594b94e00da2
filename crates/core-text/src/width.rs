//! Grapheme cluster display width in terminal cells.
//!
//! Width precedence:
//! 1. Empty or control-only clusters occupy no cells.
//! 2. Emoji / pictographic clusters occupy two cells.
//! 3. Indic clusters (base consonant plus vowel signs) occupy the sum of their
//!    spacing code points; non-spacing marks contribute nothing.
//! 4. Everything else uses the `unicode_width` value of the cluster, clamped
//!    to at most two cells.
//!
//! Invariants:
//! * A cluster with a visible base never measures zero.
//! * Classification favors over-estimation; an extra blank cell is harmless,
//!   under-estimation makes text spill out of the page area.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EgcKind {
    Empty,
    Ascii,
    Emoji,
    Indic,
    Other,
}

const ZWJ: char = '\u{200D}';

fn is_extended_pictographic(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c) || ('\u{2600}'..='\u{27BF}').contains(&c)
}

// Gurmukhi plus the neighbouring Devanagari/Bengali blocks used in headings.
fn is_indic(c: char) -> bool {
    ('\u{0900}'..='\u{0A7F}').contains(&c)
}

fn classify(egc: &str) -> EgcKind {
    let mut chars = egc.chars();
    let Some(first) = chars.next() else {
        return EgcKind::Empty;
    };
    if first.is_ascii() && chars.next().is_none() {
        return if first.is_ascii_control() {
            EgcKind::Empty
        } else {
            EgcKind::Ascii
        };
    }
    if egc.chars().any(is_extended_pictographic) {
        return EgcKind::Emoji;
    }
    if is_indic(first) {
        return EgcKind::Indic;
    }
    if egc.chars().all(|c| c == ZWJ || c.is_control()) {
        return EgcKind::Empty;
    }
    EgcKind::Other
}

/// Width in cells of one extended grapheme cluster.
pub fn egc_width(egc: &str) -> u16 {
    match classify(egc) {
        EgcKind::Empty => 0,
        EgcKind::Ascii => 1,
        EgcKind::Emoji => 2,
        EgcKind::Indic => {
            let spacing: usize = egc.chars().filter_map(UnicodeWidthChar::width).sum();
            spacing.max(1) as u16
        }
        EgcKind::Other => UnicodeWidthStr::width(egc).clamp(1, 2) as u16,
    }
}

/// Width in cells of an arbitrary string.
pub fn str_width(s: &str) -> u16 {
    s.graphemes(true)
        .fold(0u16, |acc, egc| acc.saturating_add(egc_width(egc)))
}

/// Longest prefix of `s` (on cluster boundaries) that fits in `max` cells.
pub fn truncate_to_width(s: &str, max: u16) -> &str {
    let mut used = 0u16;
    for (idx, egc) in s.grapheme_indices(true) {
        let w = egc_width(egc);
        if used.saturating_add(w) > max {
            return &s[..idx];
        }
        used = used.saturating_add(w);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_empty() {
        assert_eq!(egc_width("a"), 1);
        assert_eq!(egc_width(""), 0);
        assert_eq!(egc_width("\u{7}"), 0);
        assert_eq!(str_width("hello world"), 11);
    }

    #[test]
    fn wide_and_emoji_clusters() {
        assert_eq!(egc_width("界"), 2);
        assert_eq!(egc_width("😀"), 2);
        assert_eq!(egc_width("👍🏽"), 2);
    }

    #[test]
    fn gurmukhi_clusters_count_spacing_marks_only() {
        // ka + u (non-spacing) measures as the base alone
        assert_eq!(egc_width("ਕੁ"), 1);
        assert!(egc_width("ਕਾ") >= egc_width("ਕੁ"));
        assert_eq!(egc_width("ੴ"), 1);
        assert!(str_width("ਸਤਿ ਨਾਮੁ") >= 5);
    }

    #[test]
    fn truncation_respects_cluster_boundaries() {
        assert_eq!(truncate_to_width("abcdef", 3), "abc");
        assert_eq!(truncate_to_width("a界b", 2), "a");
        assert_eq!(truncate_to_width("ab", 10), "ab");
    }
}
