//! islet-panel — the island panel's control loop and its collaborator seams.
//!
//! Everything flows through one `tokio` event loop ([`core::PanelCore`]):
//! pointer samples, media notifications, query results, calendar results,
//! settings changes, and client commands arrive as [`core::PanelEvent`]s on
//! a single mpsc queue; state changes leave as [`PanelUpdate`] broadcasts.
//! The renderer, window chrome, and status-bar item are external — they link
//! this crate, implement [`host::WindowHost`], and subscribe to the
//! broadcast channel.

pub mod calendar;
pub mod core;
pub mod host;
pub mod media;
pub mod nowplaying;
pub mod pointer;
pub mod settings;
pub mod sizing;

use std::sync::Arc;

use islet_core::geometry::Rect;
use islet_core::nowplaying::NowPlayingSnapshot;

use crate::calendar::CalendarEvent;

/// What the control loop broadcasts to the renderer and any other listener.
#[derive(Debug, Clone)]
pub enum PanelUpdate {
    /// The panel expanded or collapsed.
    ExpansionChanged(bool),
    /// The pin was toggled.
    PinnedChanged(bool),
    /// The pill was shown or hidden.
    VisibilityChanged(bool),
    /// The now-playing snapshot changed (`None` = no media).
    NowPlayingUpdated(Option<NowPlayingSnapshot>),
    /// Interpolated playback position, seconds.  Sent on the interpolation
    /// tick while playing.
    PositionTick(f64),
    /// Upcoming calendar events changed.
    CalendarUpdated(Arc<Vec<CalendarEvent>>),
    /// A new window frame was applied to the host.
    FrameChanged(Rect),
}
