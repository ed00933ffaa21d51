use crate::render::scene::{Scene, Viewport};

/// Drawing target for one visualization mode.
pub trait RenderSurface {
    /// Current drawable size; the arc view scales to it every cycle.
    fn viewport(&self) -> Viewport;
    /// Replace the surface content with `scene`.
    fn present(&mut self, scene: Scene);
    /// Back to the blank initial state.
    fn reset(&mut self);
    fn set_visible(&mut self, _visible: bool) {}
}

/// Surface that keeps what it was given instead of painting it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    viewport: Viewport,
    current: Option<Scene>,
    visible: bool,
    presented: usize,
    resets: usize,
}

impl RecordingSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            current: None,
            visible: false,
            presented: 0,
            resets: 0,
        }
    }

    pub fn current(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    pub fn is_blank(&self) -> bool {
        self.current.is_none()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl RenderSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self, scene: Scene) {
        self.current = Some(scene);
        self.presented += 1;
    }

    fn reset(&mut self) {
        self.current = None;
        self.resets += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
