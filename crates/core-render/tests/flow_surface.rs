use core_model::{DisplayLine, RawLine, SourceId, VisraamKind, VisraamMark};
use core_reader::markup::{SOFT_BREAK, line_markup, serialize_page};
use core_reader::{LayoutSurface, NoContinuity, ShabadCursor, Viewport, parse_line};
use core_render::{FlowLayout, FlowSurface};
use proptest::prelude::*;

type GeneratedLine = (u32, Vec<String>, Vec<(usize, bool)>, bool);

/// Parse generated lines, placing a page separator after each line flagged
/// as ending a source page. Separators never open or close the result,
/// matching what the builder keeps on a finished page.
fn parse_all(lines: &[GeneratedLine]) -> Vec<DisplayLine> {
    let mut cursor = ShabadCursor::default();
    let mut out = Vec::new();
    for (index, (shabad, words, marks, ends_page)) in lines.iter().enumerate() {
        let raw = RawLine {
            line_no: index as u32,
            page_no: 1,
            shabad_id: *shabad,
            verse_id: index as u32,
            text: words.join(" "),
            visraam: marks
                .iter()
                .map(|(position, main)| VisraamMark {
                    position: *position,
                    kind: if *main { VisraamKind::Main } else { VisraamKind::Secondary },
                })
                .collect(),
        };
        out.push(parse_line(&raw, &mut cursor, SourceId::Granth, &NoContinuity));
        if *ends_page && index + 1 < lines.len() {
            out.push(DisplayLine::page_separator(index as u32 + 2, *shabad));
        }
    }
    out
}

fn line_strategy() -> impl Strategy<Value = GeneratedLine> {
    (
        1u32..4,
        prop::collection::vec("[a-z]{1,6}", 1..8),
        prop::collection::vec((0usize..8, any::<bool>()), 0..3),
        any::<bool>(),
    )
}

#[test]
fn surface_tracks_height_and_width() {
    let mut surface = FlowSurface::new(Viewport::new(10, 3));
    surface.append(r#"<span class="nowrap">one two</span>"#);
    surface.append(SOFT_BREAK);
    assert_eq!(surface.rendered_height(), 1);
    surface.append("<center>heading</center>");
    assert_eq!(surface.rendered_height(), 2);
    assert!(surface.rendered_width() <= 10);

    surface.clear();
    assert_eq!(surface.rendered_height(), 0);
    surface.append("unbreakable-token");
    assert!(surface.rendered_width() > 10);
}

#[test]
fn resize_relayouts_existing_content() {
    let mut surface = FlowSurface::new(Viewport::new(40, 3));
    surface.append("aa bb cc dd");
    assert_eq!(surface.rendered_height(), 1);
    surface.set_viewport(Viewport::new(5, 3));
    assert_eq!(surface.rendered_height(), 2);
}

#[test]
fn gurmukhi_heading_is_measured_in_cells() {
    let layout = FlowLayout::layout("<center>ੴ ਸਤਿ ਨਾਮੁ ਕਰਤਾ ਪੁਰਖੁ</center>", 8);
    assert!(layout.height() >= 2);
    assert!(layout.width() <= 8);
}

proptest! {
    // The builder measures lines appended one by one with break tokens;
    // the page is later painted from the serialized markup. Both must agree,
    // including around page separators.
    #[test]
    fn measured_height_matches_serialized_page(
        lines in prop::collection::vec(line_strategy(), 1..10),
        width in 8u16..40,
    ) {
        let display = parse_all(&lines);
        let mut surface = FlowSurface::new(Viewport::new(width, 100));
        for line in &display {
            surface.append(&line_markup(line));
            surface.append(SOFT_BREAK);
        }
        let markup = serialize_page(&display);
        let painted = FlowLayout::layout(&markup, width);
        let separators = display.iter().filter(|line| line.is_page_separator).count();
        prop_assert_eq!(markup.matches("page-separator").count(), separators);
        prop_assert_eq!(surface.rendered_height(), painted.height());
        prop_assert_eq!(surface.rendered_width(), painted.width());
    }

    #[test]
    fn short_words_never_overflow(
        lines in prop::collection::vec(line_strategy(), 1..10),
        width in 8u16..40,
    ) {
        let display = parse_all(&lines);
        let layout = FlowLayout::layout(&serialize_page(&display), width);
        prop_assert!(layout.width() <= width);
    }
}
