//! Now-playing synchronizer: applies query results to the model and owns
//! the position-interpolation ticker.
//!
//! Ticker contract: armed (restarted) every time a snapshot is applied while
//! playing, cancelled the moment playback is no longer observed, and never
//! running twice — arming always aborts the previous instance first.

use std::time::{Duration, Instant};

use islet_core::nowplaying::{MediaInfo, NowPlayingModel, NowPlayingSnapshot, SnapshotChange};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::core::PanelEvent;

/// Interpolation cadence — fast enough that a seconds-granularity progress
/// readout never visibly stalls between polls.
pub const POSITION_TICK: Duration = Duration::from_millis(500);

pub struct NowPlayingSync {
    model: NowPlayingModel,
    ticker: Option<AbortHandle>,
    event_tx: mpsc::Sender<PanelEvent>,
}

impl NowPlayingSync {
    pub fn new(event_tx: mpsc::Sender<PanelEvent>) -> Self {
        Self {
            model: NowPlayingModel::new(),
            ticker: None,
            event_tx,
        }
    }

    pub fn snapshot(&self) -> Option<&NowPlayingSnapshot> {
        self.model.snapshot()
    }

    pub fn has_media(&self) -> bool {
        self.model.has_media()
    }

    /// Merge one query result and retune the ticker.
    pub fn apply(&mut self, info: Option<MediaInfo>, now: Instant) -> SnapshotChange {
        let change = self.model.apply(info, now);
        if self.model.is_playing() {
            self.arm_ticker();
        } else {
            self.stop_ticker();
        }
        change
    }

    /// One interpolation tick.  Returns the position to publish, or `None`
    /// when playback has stopped — in which case the ticker cancels itself.
    pub fn on_position_tick(&mut self, now: Instant) -> Option<f64> {
        if !self.model.is_playing() {
            self.stop_ticker();
            return None;
        }
        self.model.position(now)
    }

    fn arm_ticker(&mut self) {
        self.stop_ticker();
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(POSITION_TICK);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick fires immediately; skip it so ticks
            // land strictly between observations.
            tick.tick().await;
            loop {
                tick.tick().await;
                if tx.send(PanelEvent::PositionTick).await.is_err() {
                    break;
                }
            }
        });
        self.ticker = Some(handle.abort_handle());
    }

    pub fn stop_ticker(&mut self) {
        if let Some(h) = self.ticker.take() {
            debug!("nowplaying: position ticker stopped");
            h.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn ticker_active(&self) -> bool {
        self.ticker.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(title: &str) -> MediaInfo {
        MediaInfo {
            title: Some(title.to_string()),
            artist: None,
            artwork: None,
            playback_rate: 1.0,
            duration_secs: 180.0,
            elapsed_secs: 30.0,
        }
    }

    fn paused(title: &str) -> MediaInfo {
        MediaInfo {
            playback_rate: 0.0,
            ..playing(title)
        }
    }

    #[tokio::test]
    async fn ticker_armed_while_playing_cancelled_on_pause() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = NowPlayingSync::new(tx);
        let t0 = Instant::now();

        sync.apply(Some(playing("A")), t0);
        assert!(sync.ticker_active());

        sync.apply(Some(paused("A")), t0);
        assert!(!sync.ticker_active());
    }

    #[tokio::test]
    async fn ticker_rearmed_on_each_playing_snapshot() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = NowPlayingSync::new(tx);
        let t0 = Instant::now();

        sync.apply(Some(playing("A")), t0);
        sync.apply(Some(playing("A")), t0);
        assert!(sync.ticker_active());
    }

    #[tokio::test]
    async fn tick_after_pause_self_cancels() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = NowPlayingSync::new(tx);
        let t0 = Instant::now();

        sync.apply(Some(playing("A")), t0);
        // Pause observed through the model without going through apply's
        // retune (simulates a tick racing the pause broadcast).
        sync.model.apply(Some(paused("A")), t0);

        assert_eq!(sync.on_position_tick(t0 + POSITION_TICK), None);
        assert!(!sync.ticker_active());
    }

    #[tokio::test]
    async fn tick_reports_interpolated_position() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = NowPlayingSync::new(tx);
        let t0 = Instant::now();

        sync.apply(Some(playing("A")), t0);
        let pos = sync.on_position_tick(t0 + Duration::from_secs(2)).unwrap();
        assert!((pos - 32.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn clearing_media_stops_ticker() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = NowPlayingSync::new(tx);
        let t0 = Instant::now();

        sync.apply(Some(playing("A")), t0);
        sync.apply(None, t0);
        // First nil keeps the snapshot but it is still playing, so the
        // ticker stays armed.
        assert!(sync.ticker_active());
        sync.apply(None, t0);
        assert!(!sync.ticker_active());
        assert!(!sync.has_media());
    }
}
