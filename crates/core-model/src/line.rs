use serde::{Deserialize, Serialize};

use crate::{PageNumber, ShabadId};

/// A display-ready line: markup plus the metadata the paginator needs.
///
/// `text` is reader markup (see `core_reader::markup`). Page separators carry
/// empty text; they only record where a source page boundary fell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayLine {
    pub text: String,
    #[serde(default)]
    pub is_heading: bool,
    #[serde(default)]
    pub is_page_separator: bool,
    #[serde(default)]
    pub line_no: u32,
    #[serde(default)]
    pub page_no: PageNumber,
    #[serde(default)]
    pub shabad_id: ShabadId,
    #[serde(default)]
    pub verse_id: u32,
}

impl DisplayLine {
    /// Zero-width marker for the start of source page `page_no`.
    ///
    /// `shabad_id` should be the group of the line preceding the marker so the
    /// marker never looks like the start of a new group.
    pub fn page_separator(page_no: PageNumber, shabad_id: ShabadId) -> Self {
        Self {
            text: String::new(),
            is_heading: false,
            is_page_separator: true,
            line_no: 0,
            page_no,
            shabad_id,
            verse_id: 0,
        }
    }

    /// True when this line opens a new visual block directly after `previous`.
    pub fn starts_group_after(&self, previous: &DisplayLine) -> bool {
        !self.is_page_separator && self.is_heading && self.shabad_id != previous.shabad_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(shabad_id: ShabadId, is_heading: bool) -> DisplayLine {
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
    fn group_start_requires_heading_and_new_id() {
        assert!(line(2, true).starts_group_after(&line(1, false)));
        assert!(!line(2, false).starts_group_after(&line(1, false)));
        assert!(!line(1, true).starts_group_after(&line(1, false)));
        assert!(!DisplayLine::page_separator(4, 9).starts_group_after(&line(1, false)));
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let json = serde_json::to_value(DisplayLine::page_separator(3, 5)).unwrap();
        assert_eq!(json["isPageSeparator"], true);
        assert_eq!(json["pageNo"], 3);
        assert_eq!(json["shabadId"], 5);
    }
}
