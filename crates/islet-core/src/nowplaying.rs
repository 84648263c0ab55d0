//! Now-playing model: the last observed media snapshot and the rules for
//! merging fresh query results into it.
//!
//! The merge rules exist to keep the displayed title stable under bursty
//! notifications: a result only replaces title/artist/artwork when the title
//! string actually differs.  Clock values are passed in so the rules stay
//! deterministic under test.

use std::sync::Arc;
use std::time::Instant;

/// Artwork is opaque to the core — decoded and drawn by the renderer.
/// Cheap to clone; Debug prints the length, not the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Artwork(Arc<Vec<u8>>);

impl Artwork {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Artwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Artwork({} bytes)", self.0.len())
    }
}

/// One answer from the external "get now playing info" query.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<Vec<u8>>,
    pub playback_rate: f64,
    pub duration_secs: f64,
    pub elapsed_secs: f64,
}

/// Last-known media metadata plus the instant it was observed.
#[derive(Debug, Clone)]
pub struct NowPlayingSnapshot {
    pub title: String,
    pub artist: Option<String>,
    pub artwork: Option<Artwork>,
    pub is_playing: bool,
    pub duration_secs: f64,
    pub position_secs: f64,
    pub observed_rate: f64,
    pub observed_at: Instant,
}

impl NowPlayingSnapshot {
    fn from_info(title: String, info: &MediaInfo, now: Instant) -> Self {
        Self {
            title,
            artist: info.artist.clone(),
            artwork: info.artwork.clone().map(Artwork::new),
            is_playing: info.playback_rate > 0.0,
            duration_secs: info.duration_secs,
            position_secs: info.elapsed_secs,
            observed_rate: info.playback_rate,
            observed_at: now,
        }
    }

    /// Playback position extrapolated from the last observation.
    ///
    /// Clamped to `[0, duration]`.  A zero duration disables interpolation
    /// entirely: the raw reported position is returned as-is.
    pub fn interpolated_position(&self, now: Instant) -> f64 {
        if self.duration_secs <= 0.0 {
            return self.position_secs;
        }
        let elapsed = now.saturating_duration_since(self.observed_at).as_secs_f64();
        let pos = self.position_secs + elapsed * self.observed_rate;
        pos.clamp(0.0, self.duration_secs)
    }
}

/// What [`NowPlayingModel::apply`] did with a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotChange {
    /// Snapshot replaced wholesale (includes media appearing or clearing).
    TrackChanged,
    /// Same track: position/rate/playing updated, artwork possibly
    /// backfilled.
    Progress,
    /// Nothing observable changed.
    Unchanged,
}

/// Holds the optional snapshot and the clear-confirmation state.
///
/// A no-title result while a snapshot is held does not clear it; it arms a
/// pending clear.  Only a second consecutive no-title result clears —
/// transient query hiccups cannot blank a playing track.
#[derive(Debug, Default)]
pub struct NowPlayingModel {
    snapshot: Option<NowPlayingSnapshot>,
    pending_clear: bool,
}

impl NowPlayingModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&NowPlayingSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn has_media(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.is_playing)
    }

    /// Merge one query result.  `None` (query failed / empty answer) is
    /// treated the same as a result without a title.
    pub fn apply(&mut self, info: Option<MediaInfo>, now: Instant) -> SnapshotChange {
        let info = info.unwrap_or_default();

        let Some(title) = info.title.clone() else {
            return self.apply_titleless();
        };
        self.pending_clear = false;

        match &mut self.snapshot {
            Some(current) if current.title == title => {
                // Progress update: never clobber good artwork with nothing,
                // but do backfill when artwork arrives late.
                if current.artwork.is_none() {
                    if let Some(bytes) = info.artwork.clone() {
                        current.artwork = Some(Artwork::new(bytes));
                    }
                }
                current.is_playing = info.playback_rate > 0.0;
                current.position_secs = info.elapsed_secs;
                current.observed_rate = info.playback_rate;
                current.observed_at = now;
                SnapshotChange::Progress
            }
            _ => {
                self.snapshot = Some(NowPlayingSnapshot::from_info(title, &info, now));
                SnapshotChange::TrackChanged
            }
        }
    }

    fn apply_titleless(&mut self) -> SnapshotChange {
        if self.snapshot.is_none() {
            self.pending_clear = false;
            return SnapshotChange::Unchanged;
        }
        if self.pending_clear {
            self.snapshot = None;
            self.pending_clear = false;
            SnapshotChange::TrackChanged
        } else {
            self.pending_clear = true;
            SnapshotChange::Unchanged
        }
    }

    /// Interpolated position of the held snapshot, if any.
    pub fn position(&self, now: Instant) -> Option<f64> {
        self.snapshot.as_ref().map(|s| s.interpolated_position(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn info(title: &str, elapsed: f64, rate: f64) -> MediaInfo {
        MediaInfo {
            title: Some(title.to_string()),
            artist: Some("artist".to_string()),
            artwork: None,
            playback_rate: rate,
            duration_secs: 200.0,
            elapsed_secs: elapsed,
        }
    }

    #[test]
    fn new_title_replaces_wholesale() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();

        let mut first = info("A", 10.0, 1.0);
        first.artwork = Some(vec![1, 2, 3]);
        assert_eq!(model.apply(Some(first), t0), SnapshotChange::TrackChanged);

        let mut second = info("B", 0.0, 1.0);
        second.artist = Some("other".to_string());
        assert_eq!(model.apply(Some(second), t0), SnapshotChange::TrackChanged);

        let snap = model.snapshot().unwrap();
        assert_eq!(snap.title, "B");
        assert_eq!(snap.artist.as_deref(), Some("other"));
        // Track change drops the old artwork even when the new one is absent.
        assert!(snap.artwork.is_none());
        assert_eq!(snap.position_secs, 0.0);
    }

    #[test]
    fn progress_update_keeps_artwork() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();

        let mut first = info("A", 10.0, 1.0);
        first.artwork = Some(vec![0xAA]);
        model.apply(Some(first), t0);

        // Same title, no artwork in the fresh result.
        let change = model.apply(Some(info("A", 42.0, 1.0)), t0);
        assert_eq!(change, SnapshotChange::Progress);

        let snap = model.snapshot().unwrap();
        assert!(snap.artwork.is_some());
        assert_eq!(snap.position_secs, 42.0);
    }

    #[test]
    fn artwork_backfill_is_not_a_track_change() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        model.apply(Some(info("A", 10.0, 1.0)), t0);
        assert!(model.snapshot().unwrap().artwork.is_none());

        let mut update = info("A", 11.0, 1.0);
        update.artwork = Some(vec![0xBB]);
        assert_eq!(model.apply(Some(update), t0), SnapshotChange::Progress);
        assert!(model.snapshot().unwrap().artwork.is_some());
    }

    #[test]
    fn pause_observed_via_rate() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        model.apply(Some(info("A", 10.0, 1.0)), t0);
        assert!(model.is_playing());

        model.apply(Some(info("A", 10.0, 0.0)), t0);
        assert!(!model.is_playing());
    }

    #[test]
    fn single_nil_keeps_snapshot_second_clears() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        model.apply(Some(info("A", 10.0, 1.0)), t0);

        assert_eq!(model.apply(None, t0), SnapshotChange::Unchanged);
        assert!(model.has_media());

        assert_eq!(model.apply(None, t0), SnapshotChange::TrackChanged);
        assert!(!model.has_media());
    }

    #[test]
    fn titled_result_disarms_pending_clear() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        model.apply(Some(info("A", 10.0, 1.0)), t0);
        model.apply(None, t0);
        model.apply(Some(info("A", 12.0, 1.0)), t0);
        // The earlier nil no longer counts.
        assert_eq!(model.apply(None, t0), SnapshotChange::Unchanged);
        assert!(model.has_media());
    }

    #[test]
    fn nil_with_no_snapshot_is_noop() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        assert_eq!(model.apply(None, t0), SnapshotChange::Unchanged);
        assert_eq!(model.apply(None, t0), SnapshotChange::Unchanged);
    }

    #[test]
    fn interpolation_advances_and_clamps() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        model.apply(Some(info("A", 100.0, 1.0)), t0);

        let at_3s = model.position(t0 + Duration::from_secs(3)).unwrap();
        assert!((at_3s - 103.0).abs() < 1e-9);

        // Clamped exactly to the duration, never past it.
        let at_200s = model.position(t0 + Duration::from_secs(200)).unwrap();
        assert_eq!(at_200s, 200.0);
        let way_past = model.position(t0 + Duration::from_secs(10_000)).unwrap();
        assert_eq!(way_past, 200.0);
    }

    #[test]
    fn interpolation_respects_rate() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        model.apply(Some(info("A", 100.0, 2.0)), t0);
        let at_3s = model.position(t0 + Duration::from_secs(3)).unwrap();
        assert!((at_3s - 106.0).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_disables_interpolation() {
        let t0 = Instant::now();
        let mut model = NowPlayingModel::new();
        let mut live = info("Stream", 37.0, 1.0);
        live.duration_secs = 0.0;
        model.apply(Some(live), t0);

        let pos = model.position(t0 + Duration::from_secs(60)).unwrap();
        assert_eq!(pos, 37.0);
    }
}
