//! Wire records returned by the remote content API and their normalized form.
//!
//! The API answers `GET /{page}/{source}` with `{ "page": [ ApiLine, .. ] }`.
//! An absent or `null` page array means the source has no content there.
//! Pause-mark ("visraam") data is decoded leniently: anything that does not
//! look like a list of `{p, t}` entries degrades to "no marks".

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{PageNumber, ShabadId};

/// Which verse field is used as display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextScript {
    /// Unicode Gurmukhi (`verse.unicode`), falling back to the font encoding when absent.
    #[default]
    Unicode,
    /// Legacy ASCII font encoding (`verse.gurmukhi`).
    Gurmukhi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisraamKind {
    /// Primary pause; the reader may break the line after the marked word.
    Main,
    /// Secondary ("yamki") pause; styled only.
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisraamMark {
    /// Word index (space-delimited) within the verse text.
    pub position: usize,
    pub kind: VisraamKind,
}

/// One verse as consumed by the line parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line_no: u32,
    pub page_no: PageNumber,
    pub shabad_id: ShabadId,
    pub verse_id: u32,
    pub text: String,
    pub visraam: Vec<VisraamMark>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPage {
    #[serde(default)]
    pub page: Option<Vec<ApiLine>>,
}

impl ApiPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<ApiLine>) -> Self {
        Self { page: Some(lines) }
    }

    pub fn is_empty(&self) -> bool {
        self.page.as_ref().is_none_or(Vec::is_empty)
    }

    pub fn into_raw_lines(self, script: TextScript) -> Vec<RawLine> {
        self.page
            .unwrap_or_default()
            .into_iter()
            .map(|line| line.into_raw(script))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLine {
    #[serde(default)]
    pub line_no: u32,
    #[serde(default)]
    pub page_no: PageNumber,
    pub shabad_id: ShabadId,
    #[serde(default)]
    pub verse_id: u32,
    pub verse: ApiVerse,
    #[serde(default, deserialize_with = "lenient_visraam")]
    pub visraam: Vec<VisraamMark>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiVerse {
    #[serde(default)]
    pub gurmukhi: String,
    #[serde(default)]
    pub unicode: Option<String>,
}

impl ApiLine {
    pub fn into_raw(self, script: TextScript) -> RawLine {
        let ApiVerse { gurmukhi, unicode } = self.verse;
        let text = match script {
            TextScript::Unicode => unicode.filter(|u| !u.is_empty()).unwrap_or(gurmukhi),
            TextScript::Gurmukhi => gurmukhi,
        };
        RawLine {
            line_no: self.line_no,
            page_no: self.page_no,
            shabad_id: self.shabad_id,
            verse_id: self.verse_id,
            text,
            visraam: self.visraam,
        }
    }
}

fn lenient_visraam<'de, D>(deserializer: D) -> Result<Vec<VisraamMark>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(visraam_from_value(&value))
}

/// Extract `sttm` pause marks from a raw visraam payload. Never fails.
pub(crate) fn visraam_from_value(value: &Value) -> Vec<VisraamMark> {
    let Some(entries) = value.get("sttm").and_then(Value::as_array) else {
        if !value.is_null() {
            tracing::trace!(target: "model.visraam", "visraam_payload_ignored");
        }
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let position = match entry.get("p")? {
                Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            let kind = match entry.get("t")?.as_str()? {
                "v" => VisraamKind::Main,
                "y" => VisraamKind::Secondary,
                _ => return None,
            };
            Some(VisraamMark { position, kind })
        })
        .collect()
}
