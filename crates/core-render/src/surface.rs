use core_reader::{LayoutSurface, Viewport};

use crate::flow::FlowLayout;

/// Sizing surface backed by the terminal flow layout. The whole content is
/// laid out again on every append; pages are a few dozen lines at most.
#[derive(Debug, Clone, Default)]
pub struct FlowSurface {
    viewport: Viewport,
    markup: String,
    layout: FlowLayout,
}

impl FlowSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }
}

impl LayoutSurface for FlowSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.layout = FlowLayout::layout(&self.markup, viewport.width);
    }

    fn clear(&mut self) {
        self.markup.clear();
        self.layout = FlowLayout::default();
    }

    fn append(&mut self, markup: &str) {
        self.markup.push_str(markup);
        self.layout = FlowLayout::layout(&self.markup, self.viewport.width);
    }

    fn rendered_height(&self) -> u16 {
        self.layout.height()
    }

    fn rendered_width(&self) -> u16 {
        self.layout.width()
    }
}
