//! Text measurement for terminal layout.
//!
//! All display width decisions in the reader flow through [`width::egc_width`];
//! layout code never calls `unicode_width` directly.

pub mod width;

pub use width::{egc_width, str_width, truncate_to_width};
