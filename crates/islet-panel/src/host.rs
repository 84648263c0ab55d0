//! Window-host seam.
//!
//! The real host is an AppKit shell owned by the embedding app; the core
//! only ever talks to this trait.  [`HeadlessHost`] is the reference
//! implementation used by the `islet` binary and the tests.

use islet_core::geometry::Rect;
use tracing::debug;

/// The borderless always-on-top window the panel lives in.
pub trait WindowHost: Send + 'static {
    /// Frame of the primary display, bottom-left origin.
    fn screen_frame(&self) -> Rect;

    /// Move/resize the window.  Called once per animation frame.
    fn apply_frame(&mut self, frame: Rect);

    /// Order the window in or out.
    fn set_visible(&mut self, visible: bool);
}

/// Host that applies frames to nothing but the log.  Used headless.
pub struct HeadlessHost {
    screen: Rect,
}

impl HeadlessHost {
    pub fn new(screen: Rect) -> Self {
        Self { screen }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 1440.0, 900.0))
    }
}

impl WindowHost for HeadlessHost {
    fn screen_frame(&self) -> Rect {
        self.screen
    }

    fn apply_frame(&mut self, frame: Rect) {
        debug!(
            "host: frame ({:.0},{:.0}) {:.0}x{:.0}",
            frame.x, frame.y, frame.width, frame.height
        );
    }

    fn set_visible(&mut self, visible: bool) {
        debug!("host: visible → {}", visible);
    }
}
