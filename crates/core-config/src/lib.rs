//! Configuration loading and parsing.
//!
//! Parse `banireader.toml` (or an override path provided by the binary).
//! Every section is optional and unknown fields are ignored so older files
//! keep working; a file that fails to parse falls back to defaults with a
//! warning rather than aborting startup.
//!
//! Sections:
//! * `[api]` `base_url`, `timeout_secs`, `script` (`unicode` | `gurmukhi`).
//! * `[layout]` `margin_columns`, `margin_rows` around the page text.
//! * `[[continuity]]` `source`, `first`, `last`: shabad id ranges that flow on
//!   from the previous shabad. Omitting the section keeps the built-in Japji
//!   Sahib rule; an empty list disables all exemptions.
//! * `[sources.G]` / `[sources.D]` `total_pages`.
//! * `[persistence]` `state_path`, `frame_interval_ms`.
//!
//! Margins are clamped against the terminal size in `Config::apply_context`;
//! the raw values are retained so a resize can re-clamp.

pub mod store;

pub use store::{AppSettings, PersistedState, StateStore};

use anyhow::Result;
use core_api::{ClientOptions, DEFAULT_BASE_URL};
use core_model::{PageNumber, ShabadId, SourceId, TextScript};
use core_reader::{ContinuityRange, ContinuityTable, LineSourceOptions, Viewport};
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "banireader.toml";
pub const APP_DIR_NAME: &str = "banireader";
const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigContext {
    pub terminal_columns: u16,
    pub terminal_rows: u16,
    pub status_rows: u16,
}

impl ConfigContext {
    pub fn new(terminal_columns: u16, terminal_rows: u16, status_rows: u16) -> Self {
        Self {
            terminal_columns,
            terminal_rows,
            status_rows,
        }
    }

    pub fn text_rows(&self) -> u16 {
        self.terminal_rows.saturating_sub(self.status_rows)
    }
}

/// Page text area inside the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextArea {
    pub x: u16,
    pub y: u16,
    pub viewport: Viewport,
}

impl Default for TextArea {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            viewport: Viewport::new(1, 1),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub script: TextScript,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
            script: TextScript::default(),
        }
    }
}

impl ApiConfig {
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }
    const fn default_timeout_secs() -> u64 {
        30
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutConfig {
    #[serde(default = "LayoutConfig::default_margin_columns")]
    pub margin_columns: u16,
    #[serde(default = "LayoutConfig::default_margin_rows")]
    pub margin_rows: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_columns: Self::default_margin_columns(),
            margin_rows: Self::default_margin_rows(),
        }
    }
}

impl LayoutConfig {
    const fn default_margin_columns() -> u16 {
        4
    }
    const fn default_margin_rows() -> u16 {
        1
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ContinuityEntry {
    pub source: SourceId,
    pub first: ShabadId,
    pub last: ShabadId,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct SourceConfig {
    #[serde(default)]
    pub total_pages: Option<PageNumber>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SourcesConfig {
    #[serde(default, rename = "G")]
    pub granth: SourceConfig,
    #[serde(default, rename = "D")]
    pub dasam: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, source: SourceId) -> SourceConfig {
        match source {
            SourceId::Granth => self.granth,
            SourceId::Dasam => self.dasam,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default = "PersistenceConfig::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            frame_interval_ms: Self::default_frame_interval_ms(),
        }
    }
}

impl PersistenceConfig {
    const fn default_frame_interval_ms() -> u64 {
        16
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub continuity: Option<Vec<ContinuityEntry>>,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub text_area: TextArea, // margins clamped to the terminal
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
                text_area: TextArea::default(), // computed later
            })
        }
        Err(error) => {
            warn!(target: "config", path = %path.display(), %error, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Fit the configured margins into the terminal and derive the page
    /// text area. The viewport never shrinks below 1x1.
    pub fn apply_context(&mut self, ctx: ConfigContext) -> TextArea {
        let raw_x = self.file.layout.margin_columns;
        let raw_y = self.file.layout.margin_rows;
        let columns = ctx.terminal_columns;
        let rows = ctx.text_rows();
        let margin_x = raw_x.min(columns.saturating_sub(1) / 2);
        let margin_y = raw_y.min(rows.saturating_sub(1) / 2);

        if (margin_x, margin_y) != (raw_x, raw_y) {
            info!(
                target: "config",
                raw_x,
                raw_y,
                margin_x,
                margin_y,
                columns,
                rows,
                "layout_margins_clamped"
            );
        }
        let viewport = Viewport::new(
            columns.saturating_sub(margin_x * 2).max(1),
            rows.saturating_sub(margin_y * 2).max(1),
        );
        self.text_area = TextArea {
            x: margin_x,
            y: margin_y,
            viewport,
        };
        self.text_area
    }

    /// Recompute on a terminal resize. Returns the new area when it changed.
    pub fn recompute_with_context(&mut self, ctx: ConfigContext) -> Option<TextArea> {
        let prev = self.text_area;
        let current = self.apply_context(ctx);
        if current != prev { Some(current) } else { None }
    }

    pub fn continuity_table(&self) -> ContinuityTable {
        match &self.file.continuity {
            None => ContinuityTable::default(),
            Some(entries) => ContinuityTable::new(
                entries
                    .iter()
                    .map(|entry| ContinuityRange {
                        source: entry.source,
                        first: entry.first,
                        last: entry.last,
                    })
                    .collect(),
            ),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.file.api.base_url.clone(),
            timeout: Duration::from_secs(self.file.api.timeout_secs.max(1)),
        }
    }

    pub fn line_source_options(&self, source: SourceId) -> LineSourceOptions {
        LineSourceOptions {
            script: self.file.api.script,
            total_pages: self
                .file
                .sources
                .get(source)
                .total_pages
                .unwrap_or_else(|| source.default_total_pages()),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.file.persistence.frame_interval_ms.max(1))
    }

    /// Persisted reader state location; platform data dir unless configured.
    pub fn state_path(&self) -> PathBuf {
        if let Some(path) = &self.file.persistence.state_path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(STATE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME))
    }
}
