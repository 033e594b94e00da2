//! FIFO of parsed lines refilled one source page at a time.
//!
//! Invariants:
//! * The cache is refilled only when empty.
//! * The fetch cursor advances by one after each successful fetch and never
//!   otherwise, so a failed fetch leaves cursor, cache and parser untouched.
//! * Past the last page of the source the refill yields nothing without
//!   touching the network.

use std::collections::VecDeque;
use std::sync::Arc;

use core_api::{ContentApi, FetchError};
use core_model::{DisplayLine, PageNumber, ShabadId, SourceId, TextScript};
use tracing::{debug, warn};

use crate::parser::{LineParser, ShabadCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSourceOptions {
    pub script: TextScript,
    pub total_pages: PageNumber,
}

impl LineSourceOptions {
    pub fn for_source(source: SourceId) -> Self {
        Self {
            script: TextScript::default(),
            total_pages: source.default_total_pages(),
        }
    }
}

pub struct LineSource {
    api: Arc<dyn ContentApi>,
    source: SourceId,
    options: LineSourceOptions,
    parser: LineParser,
    next_page: PageNumber,
    cache: VecDeque<DisplayLine>,
}

impl LineSource {
    pub fn new(
        api: Arc<dyn ContentApi>,
        parser: LineParser,
        source: SourceId,
        options: LineSourceOptions,
    ) -> Self {
        Self {
            api,
            source,
            options,
            parser,
            next_page: 1,
            cache: VecDeque::new(),
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn next_page_to_fetch(&self) -> PageNumber {
        self.next_page
    }

    pub fn current_shabad_id(&self) -> Option<ShabadId> {
        self.parser.cursor().last()
    }

    pub fn cached_lines(&self) -> impl ExactSizeIterator<Item = &DisplayLine> {
        self.cache.iter()
    }

    /// Next display line, fetching a page when the cache is empty. `None`
    /// means the source has no more content.
    pub async fn next_line(&mut self) -> Result<Option<DisplayLine>, FetchError> {
        if self.cache.is_empty() {
            self.refill().await?;
        }
        Ok(self.cache.pop_front())
    }

    /// Return one unconsumed line to the front of the cache.
    pub fn push_front(&mut self, line: DisplayLine) {
        self.cache.push_front(line);
    }

    /// Return consumed lines to the front, keeping their order.
    pub fn restore_front(&mut self, lines: Vec<DisplayLine>) {
        for line in lines.into_iter().rev() {
            self.cache.push_front(line);
        }
    }

    /// Drop cached lines and restart from `page` with an invalid shabad cursor.
    pub fn reset(&mut self, page: PageNumber) {
        self.cache.clear();
        self.next_page = page.max(1);
        self.parser.reset();
        debug!(target: "reader.source", source = %self.source, page = self.next_page, "reset");
    }

    pub fn restore(
        &mut self,
        next_page: PageNumber,
        current_shabad_id: Option<ShabadId>,
        cache: Vec<DisplayLine>,
    ) {
        self.next_page = next_page.max(1);
        self.parser.set_cursor(ShabadCursor::new(current_shabad_id));
        self.cache = cache.into();
    }

    async fn refill(&mut self) -> Result<(), FetchError> {
        let page = self.next_page;
        if page > self.options.total_pages {
            debug!(target: "reader.source", source = %self.source, page, "end_of_source");
            return Ok(());
        }

        let fetched = match self.api.fetch_page(self.source, page).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(target: "reader.source", source = %self.source, page, error = %err, "fetch_failed");
                return Err(err);
            }
        };
        self.next_page = page + 1;

        if fetched.is_empty() {
            debug!(target: "reader.source", source = %self.source, page, "empty_page");
            return Ok(());
        }
        let raw_lines = fetched.into_raw_lines(self.options.script);

        self.cache.extend(raw_lines.iter().map(|raw| self.parser.parse(raw)));
        let last_shabad = raw_lines.last().map_or(0, |raw| raw.shabad_id);
        self.cache
            .push_back(DisplayLine::page_separator(self.next_page, last_shabad));
        debug!(
            target: "reader.source",
            source = %self.source,
            page,
            lines = raw_lines.len(),
            "page_parsed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("source", &self.source)
            .field("next_page", &self.next_page)
            .field("cached", &self.cache.len())
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}
