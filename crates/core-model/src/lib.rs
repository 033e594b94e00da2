//! Shared data model for the reader.
//!
//! Everything here is plain data: the scripture sources the reader knows about,
//! the wire records returned by the remote content API, the display lines the
//! parser produces from them, and the per-source navigation state that is
//! persisted between sessions.
//!
//! Invariants:
//! * `RawLine` and `DisplayLine` are immutable once built; the pagination core
//!   moves them between the line cache and pages but never edits them.
//! * `SourceState` always carries exactly three rendered-page slots regardless
//!   of what the persisted JSON contained.

mod line;
mod raw;
mod source;
mod state;

pub use line::DisplayLine;
pub use raw::{ApiLine, ApiPage, ApiVerse, RawLine, TextScript, VisraamKind, VisraamMark};
pub use source::{SourceId, UnknownSource};
pub use state::{ActivePage, RENDERED_PAGE_SLOTS, SourceState};

/// Identifier grouping consecutive verses into one composition.
pub type ShabadId = u32;

/// 1-based page number within a source.
pub type PageNumber = u32;
