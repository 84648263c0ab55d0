//! Pointer-location seam.
//!
//! The sampling *timer* belongs to the control loop; this trait only answers
//! "where is the pointer right now".  On macOS the answer comes from Quartz;
//! other platforms get the trait and test doubles only.

use islet_core::geometry::Point;

pub trait PointerSource: Send + Sync + 'static {
    /// Current pointer position in bottom-left-origin screen coordinates,
    /// or `None` when it cannot be read.
    fn location(&self) -> Option<Point>;
}

#[cfg(target_os = "macos")]
pub use quartz::QuartzPointer;

#[cfg(target_os = "macos")]
mod quartz {
    use super::PointerSource;
    use core_graphics::display::CGDisplay;
    use core_graphics::event::CGEvent;
    use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
    use islet_core::geometry::Point;

    /// Reads the global pointer position from the window server.
    pub struct QuartzPointer;

    impl PointerSource for QuartzPointer {
        fn location(&self) -> Option<Point> {
            let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState).ok()?;
            let event = CGEvent::new(source).ok()?;
            let loc = event.location();
            // CGEvent reports top-left-origin coordinates; flip into the
            // bottom-left-origin space the rest of the crate uses.
            let screen = CGDisplay::main().bounds();
            Some(Point::new(loc.x, screen.size.height - loc.y))
        }
    }
}

/// Fallback for platforms without a pointer backend; the panel simply never
/// sees hover input there.
pub struct NullPointer;

impl PointerSource for NullPointer {
    fn location(&self) -> Option<Point> {
        None
    }
}
