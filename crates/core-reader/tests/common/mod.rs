#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use core_api::{ContentApi, FetchError};
use core_model::{ApiLine, ApiPage, ApiVerse, PageNumber, ShabadId, SourceId, VisraamMark};
use core_reader::markup::SOFT_BREAK;
use core_reader::{
    ContinuityRule, LayoutSurface, LineParser, LineSource, LineSourceOptions, Navigator,
    NoContinuity, PageBuilder, Viewport,
};

pub fn api_line(page: PageNumber, verse_id: u32, shabad_id: ShabadId, text: &str) -> ApiLine {
    ApiLine {
        line_no: verse_id,
        page_no: page,
        shabad_id,
        verse_id,
        verse: ApiVerse {
            gurmukhi: text.to_string(),
            unicode: None,
        },
        visraam: Vec::<VisraamMark>::new(),
    }
}

/// In-memory content API that records every request.
#[derive(Default)]
pub struct StubApi {
    pages: BTreeMap<PageNumber, Vec<ApiLine>>,
    calls: Mutex<Vec<PageNumber>>,
    failing: Mutex<BTreeSet<PageNumber>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: PageNumber, lines: Vec<ApiLine>) -> Self {
        self.pages.insert(page, lines);
        self
    }

    /// Pages of `(shabad_id, text)` pairs, numbered from 1.
    pub fn from_pages(pages: &[&[(ShabadId, &str)]]) -> Self {
        let mut api = Self::new();
        let mut verse_id = 0;
        for (index, lines) in pages.iter().enumerate() {
            let page = index as PageNumber + 1;
            let lines = lines
                .iter()
                .map(|(shabad, text)| {
                    verse_id += 1;
                    api_line(page, verse_id, *shabad, text)
                })
                .collect();
            api.pages.insert(page, lines);
        }
        api
    }

    /// The next request for `page` fails once.
    pub fn fail_once(&self, page: PageNumber) {
        self.failing.lock().unwrap().insert(page);
    }

    pub fn calls(&self) -> Vec<PageNumber> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page_count(&self) -> PageNumber {
        self.pages.keys().max().copied().unwrap_or(0)
    }

    pub fn all_texts(&self) -> Vec<String> {
        self.pages
            .values()
            .flatten()
            .map(|line| line.verse.gurmukhi.clone())
            .collect()
    }
}

#[async_trait]
impl ContentApi for StubApi {
    async fn fetch_page(&self, _source: SourceId, page: PageNumber) -> Result<ApiPage, FetchError> {
        self.calls.lock().unwrap().push(page);
        if self.failing.lock().unwrap().remove(&page) {
            return Err(FetchError::Status { page, status: 503 });
        }
        Ok(self
            .pages
            .get(&page)
            .cloned()
            .map(ApiPage::from_lines)
            .unwrap_or_else(ApiPage::empty))
    }
}

/// Every appended line occupies one row; separators and break tokens none.
pub struct RowSurface {
    viewport: Viewport,
    rows: u16,
    widest: u16,
    overflow_width: bool,
}

impl RowSurface {
    pub fn new(height: u16) -> Self {
        Self {
            viewport: Viewport::new(40, height),
            rows: 0,
            widest: 0,
            overflow_width: false,
        }
    }

    pub fn too_wide(height: u16) -> Self {
        Self {
            overflow_width: true,
            ..Self::new(height)
        }
    }
}

impl LayoutSurface for RowSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.rows = 0;
        self.widest = 0;
    }

    fn append(&mut self, markup: &str) {
        if markup == SOFT_BREAK || markup.starts_with("<p class=\"page-separator\"") {
            return;
        }
        self.rows += 1;
        self.widest = if self.overflow_width {
            self.viewport.width + 1
        } else {
            self.viewport.width.min(markup.len() as u16)
        };
    }

    fn rendered_height(&self) -> u16 {
        self.rows
    }

    fn rendered_width(&self) -> u16 {
        self.widest
    }
}

pub fn line_source(api: Arc<StubApi>, rule: Arc<dyn ContinuityRule>) -> LineSource {
    let total_pages = api.page_count();
    LineSource::new(
        api,
        LineParser::new(SourceId::Granth, rule),
        SourceId::Granth,
        LineSourceOptions {
            script: Default::default(),
            total_pages,
        },
    )
}

pub fn navigator(api: Arc<StubApi>, height: u16) -> Navigator {
    Navigator::new(
        line_source(api, Arc::new(NoContinuity)),
        PageBuilder::new(Box::new(RowSurface::new(height))),
    )
}

/// Text of every verse in `markup`, in order, with markup removed.
pub fn plain_words(markup: &str) -> Vec<String> {
    let mut out = String::new();
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().map(str::to_string).collect()
}
