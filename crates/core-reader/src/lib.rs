//! Pagination core of the reader.
//!
//! Data flows leaf-first: [`parser`] turns raw verses into display lines,
//! [`line_source`] keeps a FIFO of them refilled one source page at a time,
//! [`page_builder`] cuts pages against a [`LayoutSurface`], and
//! [`navigator`] keeps a three-slot window of built pages.
//!
//! Every piece is single-threaded. The only suspension point is the page
//! fetch inside [`LineSource::next_line`].

pub mod continuity;
pub mod line_source;
pub mod markup;
pub mod navigator;
pub mod page_builder;
pub mod parser;
pub mod surface;

pub use continuity::{ContinuityRange, ContinuityRule, ContinuityTable, NoContinuity};
pub use line_source::{LineSource, LineSourceOptions};
pub use navigator::{DisplayModes, Navigator, PageNode, Transition};
pub use page_builder::{BuildError, BuildOutcome, BuiltPage, PageBuilder, UNSUPPORTED_BANNER};
pub use parser::{LineParser, ShabadCursor, parse_line};
pub use surface::{LayoutSurface, Viewport};
