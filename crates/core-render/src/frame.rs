//! Cell grid a page is painted into before emission.
//!
//! `Cell` stores the full grapheme cluster for leader cells along with its
//! visual width; continuation cells (width 0) occupy the remaining columns of
//! a multi-column cluster and never print text.
//!
//! Invariants:
//! - Leader: width >= 1, `cluster` non-empty.
//! - Continuation: width == 0, `cluster` empty.
//! - Continuations immediately follow their leader horizontally; no gaps.

use crossterm::style::Color;
use unicode_segmentation::UnicodeSegmentation;

use core_text::egc_width;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Full grapheme cluster string (leader cells only). Empty for continuation cells.
    pub cluster: String,
    /// Visual width in terminal columns. `0` designates a continuation cell.
    pub width: u8,
    pub fg: Option<Color>,
}

impl Cell {
    #[inline]
    pub fn leader(cluster: &str, width: u16, fg: Option<Color>) -> Self {
        Self {
            cluster: cluster.to_string(),
            width: width.clamp(1, u8::MAX as u16) as u8,
            fg,
        }
    }

    #[inline]
    pub fn continuation(fg: Option<Color>) -> Self {
        Self {
            cluster: String::new(),
            width: 0,
            fg,
        }
    }

    #[inline]
    pub fn is_leader(&self) -> bool {
        self.width > 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            cluster: " ".to_string(),
            width: 1,
            fg: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Set a full cluster at (x,y) and populate continuation cells for its width.
    pub fn set_cluster(&mut self, x: u16, y: u16, cluster: &str, width: u16, fg: Option<Color>) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = width.max(1).min(self.width - x);
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell::leader(cluster, w, fg);
        }
        for dx in 1..w {
            if let Some(c_idx) = self.index(x + dx, y) {
                self.cells[c_idx] = Cell::continuation(fg);
            }
        }
    }

    /// Write `text` from (x,y) cluster by cluster; returns the column after
    /// the last cluster written. Zero-width clusters and anything past the
    /// right edge are skipped.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, fg: Option<Color>) -> u16 {
        let mut col = x;
        for egc in text.graphemes(true) {
            let w = egc_width(egc);
            if w == 0 {
                continue;
            }
            if col.saturating_add(w) > self.width {
                break;
            }
            self.set_cluster(col, y, egc, w, fg);
            col += w;
        }
        col
    }

    /// Iterate leader cells of a row, yielding (&str, width, fg, start_x).
    pub fn row_leaders(&self, y: u16) -> impl Iterator<Item = (&str, u16, Option<Color>, u16)> + '_ {
        let width = self.width;
        let start = y as usize * width as usize;
        let mut x = 0u16;
        std::iter::from_fn(move || {
            while x < width {
                let cell = &self.cells[start + x as usize];
                if cell.is_leader() {
                    let w = cell.width as u16;
                    let out = (cell.cluster.as_str(), w, cell.fg, x);
                    x = x.saturating_add(w);
                    return Some(out);
                }
                x += 1;
            }
            None
        })
    }

    /// Leader clusters of a row joined into one string (tests / diagnostics).
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        self.row_leaders(y).map(|(c, _, _, _)| c).collect()
    }
}
