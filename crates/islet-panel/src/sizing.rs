//! Window sizing driver: natural content size, target frame math, and the
//! animated resize.
//!
//! The panel is horizontally centered and anchored so its top edge
//! coincides with the screen's top edge.  Resizes animate over a fixed
//! duration with a cubic ease-in-out, except the very first layout, which
//! is applied instantaneously.

use std::time::{Duration, Instant};

use islet_core::geometry::{Rect, Size};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::core::PanelEvent;

// Content sizes, measured from the shipped tile layout.
pub const PILL_HEIGHT: f64 = 38.0;
pub const PILL_WIDTH_MEDIA: f64 = 340.0;
pub const PILL_WIDTH_IDLE: f64 = 100.0;
pub const PLAYER_TILE_WIDTH: f64 = 360.0;
pub const PLAYER_TILE_MIN_HEIGHT: f64 = 160.0;
pub const CALENDAR_TILE_WIDTH: f64 = 170.0;
pub const CALENDAR_TILE_MIN_HEIGHT: f64 = 140.0;
/// Pin row plus vertical padding around the expanded card.
pub const EXPANDED_CHROME_HEIGHT: f64 = 32.0;

/// Animation frame cadence.
const ANIMATION_TICK: Duration = Duration::from_millis(16);

/// Natural content size for a panel state.
///
/// The collapsed pill shrinks when no media is present; the expanded card
/// grows a calendar tile when upcoming events exist.
pub fn natural_size(expanded: bool, has_media: bool, has_events: bool) -> Size {
    if !expanded {
        let width = if has_media {
            PILL_WIDTH_MEDIA
        } else {
            PILL_WIDTH_IDLE
        };
        return Size::new(width, PILL_HEIGHT);
    }

    let mut width = PLAYER_TILE_WIDTH;
    let mut height = PLAYER_TILE_MIN_HEIGHT;
    if has_events {
        width += CALENDAR_TILE_WIDTH;
        height = height.max(CALENDAR_TILE_MIN_HEIGHT);
    }
    Size::new(width, height + EXPANDED_CHROME_HEIGHT)
}

/// Centered on the screen midpoint, top edge on the screen's top edge.
pub fn target_frame(size: Size, screen: Rect) -> Rect {
    Rect::new(
        screen.mid_x() - size.width / 2.0,
        screen.max_y() - size.height,
        size.width,
        size.height,
    )
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_rect(from: Rect, to: Rect, t: f64) -> Rect {
    Rect::new(
        lerp(from.x, to.x, t),
        lerp(from.y, to.y, t),
        lerp(from.width, to.width, t),
        lerp(from.height, to.height, t),
    )
}

struct Animation {
    from: Rect,
    to: Rect,
    started_at: Instant,
}

pub struct SizingDriver {
    duration: Duration,
    current: Rect,
    first_layout_done: bool,
    animation: Option<Animation>,
    ticker: Option<AbortHandle>,
    event_tx: mpsc::Sender<PanelEvent>,
}

impl SizingDriver {
    pub fn new(duration: Duration, event_tx: mpsc::Sender<PanelEvent>) -> Self {
        Self {
            duration,
            current: Rect::ZERO,
            first_layout_done: false,
            animation: None,
            ticker: None,
            event_tx,
        }
    }

    /// The frame most recently handed to the host.
    pub fn current_frame(&self) -> Rect {
        self.current
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Aim at `target`.
    ///
    /// Returns `Some(frame)` when the frame must be applied immediately
    /// (first layout, or a zero animation duration); otherwise starts — or
    /// preempts — the animation and the caller will receive the frames via
    /// `PanelEvent::AnimationTick`.
    pub fn retarget(&mut self, target: Rect, now: Instant) -> Option<Rect> {
        if !self.first_layout_done {
            self.first_layout_done = true;
            self.current = target;
            return Some(target);
        }

        let already_aimed = match &self.animation {
            Some(anim) => anim.to == target,
            None => self.current == target,
        };
        if already_aimed {
            return None;
        }

        if self.duration.is_zero() {
            self.stop();
            self.current = target;
            return Some(target);
        }

        debug!(
            "sizing: {:.0}x{:.0} → {:.0}x{:.0}",
            self.current.width, self.current.height, target.width, target.height
        );
        self.animation = Some(Animation {
            from: self.current,
            to: target,
            started_at: now,
        });
        self.start_ticker();
        None
    }

    /// Advance the animation.  Returns the next frame to apply; the final
    /// frame is the exact target, after which the ticker is stopped.
    pub fn step(&mut self, now: Instant) -> Option<Rect> {
        let anim = self.animation.as_ref()?;
        let t = now.saturating_duration_since(anim.started_at).as_secs_f64()
            / self.duration.as_secs_f64();
        let frame = if t >= 1.0 {
            let target = anim.to;
            self.animation = None;
            self.stop_ticker();
            target
        } else {
            lerp_rect(anim.from, anim.to, ease_in_out(t))
        };
        self.current = frame;
        Some(frame)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(ANIMATION_TICK);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                if tx.send(PanelEvent::AnimationTick).await.is_err() {
                    break;
                }
            }
        });
        self.ticker = Some(handle.abort_handle());
    }

    fn stop_ticker(&mut self) {
        if let Some(h) = self.ticker.take() {
            h.abort();
        }
    }

    /// Drop any in-flight animation and its ticker.
    pub fn stop(&mut self) {
        self.animation = None;
        self.stop_ticker();
    }
}
