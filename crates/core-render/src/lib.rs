//! Terminal rendering for the reader.
//!
//! Pages arrive as markup strings. Everything here works on that markup:
//! - `markup`: tokenizer for the tag subset the reader emits.
//! - `flow`: inline flow layout in terminal cells (wrapping, centering,
//!   nowrap groups, page separator markers).
//! - `surface`: [`FlowSurface`], the sizing surface the page builder measures
//!   against. It uses the same layout as painting, so a page that measured as
//!   fitting also paints as fitting.
//! - `frame` / `page_view`: paint a layout into a cell grid with theme colours.
//! - `status`: status row segments and formatting.
//! - `writer`: queued crossterm commands, one flush per frame.
//! - `terminal`: raw mode / alternate screen guard and size queries.
//!
//! Unicode correctness: widths come from `core_text` per grapheme cluster;
//! combining marks never occupy a cell of their own.

pub mod flow;
pub mod frame;
pub mod markup;
pub mod page_view;
pub mod status;
pub mod surface;
pub mod terminal;
pub mod theme;
pub mod writer;

pub use flow::{FlowLayout, Row, Run};
pub use frame::{Cell, Frame};
pub use page_view::{HELP_LINES, PageArea, paint_banner, paint_help, paint_page};
pub use surface::FlowSurface;
pub use theme::Theme;
