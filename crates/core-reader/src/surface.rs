/// Text area available to one page, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Hidden container the page builder measures candidate pages against.
///
/// Implementations lay out appended markup exactly as the visible page would
/// be laid out; the builder only reads back the resulting extent.
pub trait LayoutSurface {
    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    fn clear(&mut self);
    fn append(&mut self, markup: &str);
    /// Rows occupied by everything appended since the last `clear`.
    fn rendered_height(&self) -> u16;
    /// Widest row; exceeds the viewport width only for unbreakable content.
    fn rendered_width(&self) -> u16;
}
