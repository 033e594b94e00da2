//! Per-source navigation state as persisted between sessions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{DisplayLine, PageNumber, ShabadId};

/// Number of page slots kept rendered: previous, current and the ahead page.
pub const RENDERED_PAGE_SLOTS: usize = 3;

/// Index of the displayed slot. Only the first two slots are ever displayed;
/// the third is the pre-rendered ahead page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ActivePage {
    #[default]
    First,
    Second,
}

impl ActivePage {
    pub const fn index(self) -> usize {
        match self {
            ActivePage::First => 0,
            ActivePage::Second => 1,
        }
    }
}

impl TryFrom<u8> for ActivePage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ActivePage::First),
            1 => Ok(ActivePage::Second),
            other => Err(format!("active rendered page must be 0 or 1, got {other}")),
        }
    }
}

impl From<ActivePage> for u8 {
    fn from(value: ActivePage) -> Self {
        value.index() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceState {
    #[serde(default = "first_page")]
    pub next_page_to_fetch: PageNumber,
    /// Last-seen group id; `None` is the invalid sentinel set by a jump.
    #[serde(default, deserialize_with = "shabad_sentinel")]
    pub current_shabad_id: Option<ShabadId>,
    #[serde(default)]
    pub active_rendered_page: ActivePage,
    #[serde(default, deserialize_with = "lenient_line_cache")]
    pub line_cache: Vec<DisplayLine>,
    #[serde(default, deserialize_with = "page_slots")]
    pub rendered_pages: [Option<String>; RENDERED_PAGE_SLOTS],
}

impl Default for SourceState {
    fn default() -> Self {
        Self {
            next_page_to_fetch: first_page(),
            current_shabad_id: None,
            active_rendered_page: ActivePage::First,
            line_cache: Vec::new(),
            rendered_pages: Default::default(),
        }
    }
}

const fn first_page() -> PageNumber {
    1
}

/// Older writers used `-1` (or omitted the field) for "no group seen yet".
fn shabad_sentinel<'de, D>(deserializer: D) -> Result<Option<ShabadId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|id| ShabadId::try_from(id).ok()))
}

/// Older writers stored the cache as bare markup strings without line
/// metadata. A cache that does not decode is dropped; the other fields of
/// the state still load.
fn lenient_line_cache<'de, D>(deserializer: D) -> Result<Vec<DisplayLine>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(raw).unwrap_or_else(|err| {
        warn!(target: "model.state", error = %err, "line_cache_dropped");
        Vec::new()
    }))
}

/// Accept any length; empty strings mean "not built yet".
fn page_slots<'de, D>(deserializer: D) -> Result<[Option<String>; RENDERED_PAGE_SLOTS], D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<String>>>::deserialize(deserializer)?.unwrap_or_default();
    let mut slots: [Option<String>; RENDERED_PAGE_SLOTS] = Default::default();
    for (slot, value) in slots.iter_mut().zip(raw) {
        *slot = value.filter(|html| !html.is_empty());
    }
    Ok(slots)
}
