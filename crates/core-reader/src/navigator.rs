//! Three-slot page window.
//!
//! Slot 0 holds the previous page, slot 1 the current one and slot 2 the
//! page pre-built ahead. `active` is 0 or 1: right after a jump the first
//! slot is visible and both following slots are built eagerly; the first
//! forward step only moves `active`, every later step rotates the ring and
//! builds a fresh ahead slot.
//!
//! Forward navigation is split so the runtime can keep reading input while
//! the ahead slot is built:
//! * [`Navigator::begin_next_page`] runs the guard, rotates and swaps the
//!   visible node synchronously, and reports whether a build is pending;
//! * [`Navigator::finish_navigation`] builds the ahead slot and releases the
//!   `is_navigating` guard.
//!
//! A jump resets everything, including the guard. Dropping an in-flight
//! build future and then jumping is therefore always safe.

use core_model::{ActivePage, PageNumber, RENDERED_PAGE_SLOTS, SourceId, SourceState};
use tracing::{debug, info, warn};

use crate::line_source::LineSource;
use crate::markup::separator_pages;
use crate::page_builder::{BuildError, BuildOutcome, PageBuilder, UNSUPPORTED_BANNER};
use crate::surface::Viewport;

/// Presentation toggles; none of them affect pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayModes {
    pub hidden: bool,
    pub show_visraam: bool,
    pub show_page_number: bool,
}

impl Default for DisplayModes {
    fn default() -> Self {
        Self {
            hidden: true,
            show_visraam: true,
            show_page_number: false,
        }
    }
}

/// Visible content of one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageNode {
    content: Option<String>,
    first_page: Option<PageNumber>,
}

impl PageNode {
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Source page the node starts on, when known.
    pub fn first_page(&self) -> Option<PageNumber> {
        self.first_page
    }

    fn fill(&mut self, markup: &str, first_page: Option<PageNumber>) {
        self.content = Some(markup.to_owned());
        self.first_page =
            first_page.or_else(|| separator_pages(markup).next().map(|p| p.saturating_sub(1)));
    }
}

#[derive(Debug, Clone, Default)]
struct PageSlot {
    node: PageNode,
    serialized: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Another transition is in flight or the reader shows the banner.
    Ignored,
    /// No page ahead.
    AtEnd,
    /// The ahead page is missing because its last build failed.
    Stalled,
    Advanced { pending_build: bool },
}

#[derive(Debug)]
pub struct Navigator {
    lines: LineSource,
    builder: PageBuilder,
    slots: [PageSlot; RENDERED_PAGE_SLOTS],
    active: ActivePage,
    is_navigating: bool,
    last_build_failed: bool,
    banner: Option<&'static str>,
    modes: DisplayModes,
    dirty: bool,
}

impl Navigator {
    pub fn new(lines: LineSource, builder: PageBuilder) -> Self {
        Self {
            lines,
            builder,
            slots: Default::default(),
            active: ActivePage::First,
            is_navigating: false,
            last_build_failed: false,
            banner: None,
            modes: DisplayModes::default(),
            dirty: false,
        }
    }

    pub fn source(&self) -> SourceId {
        self.lines.source()
    }

    pub fn active_rendered_page(&self) -> ActivePage {
        self.active
    }

    pub fn is_navigating(&self) -> bool {
        self.is_navigating
    }

    pub fn current_page(&self) -> &PageNode {
        &self.slots[self.active.index()].node
    }

    pub fn serialized(&self, index: usize) -> Option<&str> {
        self.slots.get(index)?.serialized.as_deref()
    }

    pub fn banner(&self) -> Option<&'static str> {
        self.banner
    }

    pub fn modes(&self) -> DisplayModes {
        self.modes
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.modes.hidden = hidden;
    }

    pub fn set_show_visraam(&mut self, show: bool) {
        self.modes.show_visraam = show;
    }

    pub fn set_show_page_number(&mut self, show: bool) {
        self.modes.show_page_number = show;
    }

    pub fn viewport(&self) -> Viewport {
        self.builder.viewport()
    }

    /// Resize the sizing surface. Pages already built keep their layout, so a
    /// page built for a taller viewport paints clipped until it is rebuilt;
    /// the caller decides when to rebuild.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        debug!(target: "reader.nav", width = viewport.width, height = viewport.height, "viewport");
        self.builder.set_viewport(viewport);
    }

    /// True once after every mutation that should be persisted.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn snapshot(&self) -> SourceState {
        SourceState {
            next_page_to_fetch: self.lines.next_page_to_fetch(),
            current_shabad_id: self.lines.current_shabad_id(),
            active_rendered_page: self.active,
            line_cache: self.lines.cached_lines().cloned().collect(),
            rendered_pages: std::array::from_fn(|i| self.slots[i].serialized.clone()),
        }
    }

    /// Adopt persisted state. Nodes are refilled by the next
    /// [`Navigator::render_current_page`] without fetching.
    pub fn restore(&mut self, state: SourceState) {
        let SourceState {
            next_page_to_fetch,
            current_shabad_id,
            active_rendered_page,
            line_cache,
            rendered_pages,
        } = state;
        info!(
            target: "reader.nav",
            source = %self.source(),
            next_page = next_page_to_fetch,
            active = active_rendered_page.index(),
            cached = line_cache.len(),
            "restore"
        );
        self.lines
            .restore(next_page_to_fetch, current_shabad_id, line_cache);
        for (slot, serialized) in self.slots.iter_mut().zip(rendered_pages) {
            *slot = PageSlot {
                node: PageNode::default(),
                serialized,
            };
        }
        self.active = active_rendered_page;
        self.is_navigating = false;
        self.last_build_failed = false;
    }

    /// Show the active slot and make sure every slot from it onwards is
    /// built, in index order. Earlier slots only replay cached markup.
    pub async fn render_current_page(&mut self) -> Result<(), BuildError> {
        let active = self.active.index();
        for index in 0..active {
            if let Some(markup) = self.slots[index].serialized.clone() {
                self.slots[index].node.fill(&markup, None);
            }
        }
        for index in active..RENDERED_PAGE_SLOTS {
            self.render_page(index).await?;
        }
        Ok(())
    }

    async fn render_page(&mut self, index: usize) -> Result<(), BuildError> {
        if self.banner.is_some() {
            return Ok(());
        }
        if let Some(markup) = self.slots[index].serialized.clone() {
            self.slots[index].node.fill(&markup, None);
            return Ok(());
        }

        match self.builder.build_page(&mut self.lines).await {
            Ok(BuildOutcome::Page(page)) => {
                let first_page = page.lines.first().map(|line| line.page_no);
                let slot = &mut self.slots[index];
                slot.node.fill(&page.markup, first_page);
                slot.serialized = Some(page.markup);
                self.last_build_failed = false;
                self.dirty = true;
            }
            Ok(BuildOutcome::EndOfContent) => {
                self.last_build_failed = false;
                debug!(target: "reader.nav", slot = index, "slot_left_empty");
            }
            Ok(BuildOutcome::Unsupported) => {
                self.banner = Some(UNSUPPORTED_BANNER);
                self.dirty = true;
            }
            Err(err) => {
                self.last_build_failed = true;
                warn!(target: "reader.nav", slot = index, error = %err, "build_failed");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Synchronous half of a forward step.
    pub fn begin_next_page(&mut self) -> Transition {
        if self.is_navigating || self.banner.is_some() {
            debug!(target: "reader.nav", "next_ignored");
            return Transition::Ignored;
        }
        let ahead = self.active.index() + 1;
        if self.slots[ahead].node.content.is_none() {
            return if self.last_build_failed {
                Transition::Stalled
            } else {
                Transition::AtEnd
            };
        }

        self.is_navigating = true;
        match self.active {
            ActivePage::First => self.active = ActivePage::Second,
            ActivePage::Second => {
                self.slots.rotate_left(1);
                self.slots[RENDERED_PAGE_SLOTS - 1] = PageSlot::default();
            }
        }
        self.dirty = true;

        let pending_build = self.slots[RENDERED_PAGE_SLOTS - 1].serialized.is_none();
        if !pending_build {
            self.is_navigating = false;
        }
        debug!(
            target: "reader.nav",
            active = self.active.index(),
            pending_build,
            "next_page"
        );
        Transition::Advanced { pending_build }
    }

    /// Asynchronous half of a forward step: build the ahead slot.
    pub async fn finish_navigation(&mut self) -> Result<(), BuildError> {
        let result = self.render_page(RENDERED_PAGE_SLOTS - 1).await;
        self.is_navigating = false;
        result
    }

    pub async fn go_to_next_page(&mut self) -> Result<Transition, BuildError> {
        let transition = self.begin_next_page();
        if let Transition::Advanced { pending_build: true } = transition {
            self.finish_navigation().await?;
        }
        Ok(transition)
    }

    /// Step back one page. Only a single step of history exists.
    pub fn go_to_previous_page(&mut self) -> bool {
        if self.is_navigating || self.active == ActivePage::First {
            return false;
        }
        self.active = ActivePage::First;
        self.dirty = true;
        debug!(target: "reader.nav", "previous_page");
        true
    }

    /// Synchronous half of a jump: drop every cached line and page.
    pub fn reset_to_page(&mut self, page: PageNumber) {
        let page = page.max(1);
        info!(target: "reader.nav", source = %self.source(), page, "jump");
        self.active = ActivePage::First;
        self.lines.reset(page);
        self.slots = Default::default();
        self.is_navigating = false;
        self.last_build_failed = false;
        self.dirty = true;
    }

    pub async fn go_to_page(&mut self, page: PageNumber) -> Result<(), BuildError> {
        self.reset_to_page(page);
        self.render_current_page().await
    }
}
