//! Persisted reader state: display settings plus per-source navigation.
//!
//! The file is JSON so older state written by the web reader keeps loading.
//! That shape stored per-source objects at the top level under `"G"` / `"D"`
//! and used `currentPage` for the next page to fetch; `StateStore::load`
//! migrates it on read. Writes always use the current shape.
//!
//! Writes are staged in memory and flushed on demand (the runtime flushes on
//! its tick), through a temp file and rename so a crash mid-write never
//! leaves a truncated state file behind.

use anyhow::{Context, Result};
use core_model::{SourceId, SourceState};
use core_render::theme::{
    DEFAULT_BACKGROUND, DEFAULT_TEXT, DEFAULT_VISRAAM, DEFAULT_VISRAAM_YAMKI,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub source: SourceId,
    pub background_color: String,
    pub text_color: String,
    pub visraam_color: String,
    pub visraam_color_yamki: String,
    pub show_visraam: bool,
    pub show_page_number: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source: SourceId::Granth,
            background_color: DEFAULT_BACKGROUND.to_string(),
            text_color: DEFAULT_TEXT.to_string(),
            visraam_color: DEFAULT_VISRAAM.to_string(),
            visraam_color_yamki: DEFAULT_VISRAAM_YAMKI.to_string(),
            show_visraam: true,
            show_page_number: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(flatten)]
    pub settings: AppSettings,
    #[serde(default)]
    pub sources: BTreeMap<SourceId, SourceState>,
}

const SOURCES_KEY: &str = "sources";
const LEGACY_PAGE_KEY: &str = "currentPage";
const NEXT_PAGE_KEY: &str = "nextPageToFetch";

/// Rewrite the legacy top-level layout in place. Returns whether anything moved.
fn migrate_legacy(root: &mut Map<String, Value>) -> bool {
    let mut migrated = false;
    for source in SourceId::ALL {
        let Some(Value::Object(mut legacy)) = root.remove(source.code()) else {
            continue;
        };
        if !legacy.contains_key(NEXT_PAGE_KEY)
            && let Some(page) = legacy.remove(LEGACY_PAGE_KEY)
        {
            legacy.insert(NEXT_PAGE_KEY.to_string(), page);
        }
        let sources = root
            .entry(SOURCES_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(sources) = sources {
            sources
                .entry(source.code())
                .or_insert(Value::Object(legacy));
        }
        migrated = true;
    }
    migrated
}

/// Parse state JSON, accepting both the current and the legacy layout.
pub fn parse_state(content: &str) -> Result<PersistedState> {
    let mut value: Value = serde_json::from_str(content).context("state is not JSON")?;
    if let Value::Object(root) = &mut value
        && migrate_legacy(root)
    {
        debug!(target: "store", "legacy_state_migrated");
    }
    serde_json::from_value(value).context("state has unexpected shape")
}

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: PersistedState,
    dirty: bool,
}

impl StateStore {
    /// Load from `path`. A missing or unreadable file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) => match parse_state(&content) {
                Ok(state) => {
                    info!(target: "store", path = %path.display(), "state_loaded");
                    state
                }
                Err(error) => {
                    warn!(target: "store", path = %path.display(), error = %format!("{error:#}"), "state_corrupt_using_defaults");
                    PersistedState::default()
                }
            },
            Err(_) => {
                info!(target: "store", path = %path.display(), "state_missing_using_defaults");
                PersistedState::default()
            }
        };
        Self {
            path,
            state,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn settings(&self) -> &AppSettings {
        &self.state.settings
    }

    pub fn update_settings(&mut self, apply: impl FnOnce(&mut AppSettings)) {
        let before = self.state.settings.clone();
        apply(&mut self.state.settings);
        if self.state.settings != before {
            self.dirty = true;
        }
    }

    pub fn source_state(&self, source: SourceId) -> Option<&SourceState> {
        self.state.sources.get(&source)
    }

    /// Record a source snapshot; flushed later.
    pub fn stage(&mut self, source: SourceId, snapshot: SourceState) {
        if self.state.sources.get(&source) == Some(&snapshot) {
            return;
        }
        self.state.sources.insert(source, snapshot);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write staged state if anything changed. Returns whether a write happened.
    pub fn flush_if_dirty(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.write()?;
        self.dirty = false;
        Ok(true)
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create state dir {}", parent.display()))?;
        }
        let json = serde_json::to_vec(&self.state).context("serialize state")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        debug!(target: "store", path = %self.path.display(), sources = self.state.sources.len(), "state_flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{ActivePage, DisplayLine};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_state() -> SourceState {
        SourceState {
            next_page_to_fetch: 7,
            current_shabad_id: Some(42),
            active_rendered_page: ActivePage::Second,
            line_cache: vec![DisplayLine::page_separator(6, 42)],
            rendered_pages: [Some("a".into()), Some("b".into()), None],
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(dir.path().join("state.json"));
        assert_eq!(store.state(), &PersistedState::default());
        assert!(store.settings().show_visraam);
        assert!(!store.is_dirty());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let store = StateStore::load(&path);
        assert_eq!(store.state(), &PersistedState::default());
    }

    #[test]
    fn flush_then_reload_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = StateStore::load(&path);
        store.stage(SourceId::Dasam, sample_state());
        store.update_settings(|s| {
            s.source = SourceId::Dasam;
            s.show_page_number = true;
        });
        assert!(store.flush_if_dirty().unwrap());
        assert!(!store.flush_if_dirty().unwrap());

        let reloaded = StateStore::load(&path);
        assert_eq!(reloaded.state(), store.state());
        assert_eq!(reloaded.source_state(SourceId::Dasam), Some(&sample_state()));
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn unchanged_stage_is_not_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = StateStore::load(dir.path().join("state.json"));
        store.stage(SourceId::Granth, sample_state());
        store.flush_if_dirty().unwrap();
        store.stage(SourceId::Granth, sample_state());
        store.update_settings(|s| s.show_visraam = true);
        assert!(!store.is_dirty());
    }

    #[test]
    fn legacy_layout_is_migrated() {
        let legacy = json!({
            "source": "D",
            "backgroundColor": "#101010",
            "fontSize": 14,
            "showVisraam": false,
            "G": { "currentPage": 12, "activeRenderedPage": 1, "lineCache": [], "renderedPages": ["x", "y", ""] },
            "D": { "currentPage": 3, "nextPageToFetch": 5 }
        });
        let state = parse_state(&legacy.to_string()).unwrap();
        assert_eq!(state.settings.source, SourceId::Dasam);
        assert_eq!(state.settings.background_color, "#101010");
        assert!(!state.settings.show_visraam);
        assert_eq!(state.settings.text_color, DEFAULT_TEXT);

        let granth = &state.sources[&SourceId::Granth];
        assert_eq!(granth.next_page_to_fetch, 12);
        assert_eq!(granth.active_rendered_page, ActivePage::Second);
        assert_eq!(granth.rendered_pages, [Some("x".into()), Some("y".into()), None]);
        // an explicit next page wins over the legacy field
        assert_eq!(state.sources[&SourceId::Dasam].next_page_to_fetch, 5);
    }

    #[test]
    fn legacy_string_line_cache_keeps_settings() {
        let legacy = json!({
            "source": "G",
            "textColor": "#abcdef",
            "showVisraam": false,
            "G": { "currentPage": 4, "lineCache": ["<span>x</span>"], "renderedPages": ["a", "b", "c"] }
        });
        let state = parse_state(&legacy.to_string()).unwrap();
        assert_eq!(state.settings.text_color, "#abcdef");
        assert!(!state.settings.show_visraam);

        let granth = &state.sources[&SourceId::Granth];
        assert!(granth.line_cache.is_empty());
        assert_eq!(granth.next_page_to_fetch, 4);
        assert_eq!(granth.rendered_pages[2].as_deref(), Some("c"));
    }

    #[test]
    fn current_layout_round_trips_through_json() {
        let mut state = PersistedState::default();
        state.sources.insert(SourceId::Granth, sample_state());
        let text = serde_json::to_string(&state).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["showVisraam"], true);
        assert!(value["sources"]["G"].is_object());
        assert_eq!(parse_state(&text).unwrap(), state);
    }
}
