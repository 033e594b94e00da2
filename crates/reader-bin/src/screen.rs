//! Whole-terminal composition: page area plus the status row.
//!
//! The page part is painted once per navigator change and cached, so status
//! updates while a build is in flight never need the navigator.

use anyhow::Result;
use core_config::TextArea;
use core_model::{PageNumber, SourceId};
use core_reader::Navigator;
use core_render::status::{StatusContext, build_status_line};
use core_render::writer::Writer;
use core_render::{Frame, PageArea, Theme, paint_banner, paint_help, paint_page};
use std::io::Write;

pub(crate) const STATUS_ROWS: u16 = 1;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct StatusState {
    pub source: SourceId,
    pub page: Option<PageNumber>,
    pub loading: bool,
    pub prompt: Option<String>,
    pub message: Option<String>,
}

pub(crate) struct Screen {
    columns: u16,
    rows: u16,
    area: TextArea,
    theme: Theme,
    page: Frame,
    pub status: StatusState,
    /// Key binding overlay drawn in place of the page.
    pub help: bool,
}

impl Screen {
    pub fn new(columns: u16, rows: u16, area: TextArea, theme: Theme) -> Self {
        Self {
            columns,
            rows,
            area,
            theme,
            page: Frame::new(columns, rows),
            status: StatusState::default(),
            help: false,
        }
    }

    pub fn resize(&mut self, columns: u16, rows: u16, area: TextArea) {
        self.columns = columns;
        self.rows = rows;
        self.area = area;
        self.page = Frame::new(columns, rows);
    }

    /// Repaint the cached page part from the navigator's visible node.
    pub fn show(&mut self, navigator: &Navigator) {
        let mut page = Frame::new(self.columns, self.rows);
        let area = self.page_area();
        let node = navigator.current_page();
        if let Some(banner) = navigator.banner() {
            paint_banner(&mut page, area, banner, &self.theme);
        } else if let Some(markup) = node.content() {
            paint_page(&mut page, area, markup, navigator.modes(), &self.theme);
        }
        self.page = page;
        self.status.source = navigator.source();
        self.status.page = node.first_page();
    }

    fn page_area(&self) -> PageArea {
        PageArea {
            x: self.area.x,
            y: self.area.y,
            viewport: self.area.viewport,
        }
    }

    pub fn compose(&self) -> Frame {
        let mut frame = if self.help {
            let mut overlay = Frame::new(self.columns, self.rows);
            paint_help(&mut overlay, self.page_area(), &self.theme);
            overlay
        } else {
            self.page.clone()
        };
        if self.rows == 0 {
            return frame;
        }
        let ctx = StatusContext {
            source: self.status.source,
            page: self.status.page,
            loading: self.status.loading,
            prompt: self.status.prompt.as_deref(),
            message: self.status.message.as_deref(),
        };
        let line = build_status_line(&ctx, self.columns);
        frame.put_str(0, self.rows - 1, &line, Some(self.theme.text));
        frame
    }

    pub fn draw<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut writer = Writer::new();
        writer.frame(&self.compose(), self.theme.text, self.theme.background);
        writer.flush_to(out)
    }
}
