/// PanelCore — single-owner event loop for all mutable panel state.
///
/// Runs embedded in the host process.  Every external callback — pointer
/// timer tick, media notification, query completion, calendar completion,
/// settings change, user command — is marshalled onto this loop as a
/// `PanelEvent` before it touches shared state.  PanelCore owns the state
/// machine, the now-playing model, the sizing driver, and every periodic
/// task handle exclusively; no other task touches them.
///
/// After each event that changes observable state, PanelCore broadcasts a
/// `PanelUpdate` to all listeners via a `tokio::sync::broadcast` channel.
///
/// Periodic tasks (pointer sampling, position interpolation, resize
/// animation) are spawned helpers that only send events back into this
/// loop.  Each has exactly one live instance: every start aborts the
/// previous instance first, so a timer can never be silently doubled.
use std::sync::Arc;
use std::time::{Duration, Instant};

use islet_core::config::Config;
use islet_core::geometry::{self, ExpansionDecision, Point, TriggerZone};
use islet_core::nowplaying::{MediaInfo, SnapshotChange};
use islet_core::panel::{InteractionMode, PanelStateMachine, PanelTransition};
use tokio::sync::{broadcast, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::calendar::{CalendarEvent, CalendarSource};
use crate::host::WindowHost;
use crate::media::MediaSource;
use crate::nowplaying::NowPlayingSync;
use crate::pointer::PointerSource;
use crate::sizing::{self, SizingDriver};
use crate::PanelUpdate;

// ── events ────────────────────────────────────────────────────────────────────

/// One pointer observation.  Never stored — reduced to a decision and
/// dropped.
#[derive(Debug, Clone, Copy)]
pub struct PointerSample {
    pub position: Point,
    pub at: Instant,
}

/// All inputs into the PanelCore loop.
#[derive(Debug)]
pub enum PanelEvent {
    /// A sample from the pointer-tracking timer.
    Pointer(PointerSample),
    /// The media source signalled that now-playing may have changed.
    MediaChanged,
    /// Answer to a now-playing query (`None` = query failed).
    MediaInfo(Option<MediaInfo>),
    /// Position-interpolation tick.
    PositionTick,
    /// Resize-animation tick.
    AnimationTick,
    /// Fresh upcoming-events list from the calendar source.
    CalendarEvents(Vec<CalendarEvent>),
    /// The config file changed on disk.
    SettingsChanged(Config),
    /// A command from the status-bar item or a panel gesture.
    Command(PanelCommand),
    /// Shutdown requested.
    Shutdown,
}

/// User-facing controls, forwarded by the excluded UI collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Expand,
    Collapse,
    TogglePin,
    ToggleVisibility,
    /// A tap on the pill.  Expands only in click-to-expand mode.
    Click,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    RefreshCalendar,
}

// ── PanelCore ─────────────────────────────────────────────────────────────────

pub struct PanelCore {
    config: Config,
    mode: InteractionMode,
    machine: PanelStateMachine,
    sync: NowPlayingSync,
    sizing: SizingDriver,
    media: Arc<dyn MediaSource>,
    calendar: Arc<dyn CalendarSource>,
    pointer: Arc<dyn PointerSource>,
    host: Box<dyn WindowHost>,
    /// Channel to feed events (from spawned helpers) back into this loop.
    event_tx: mpsc::Sender<PanelEvent>,
    broadcast_tx: broadcast::Sender<PanelUpdate>,
    /// Live pointer-sampling task, if the current regime needs one.
    pointer_task: Option<AbortHandle>,
    /// Live media change-notification feed.
    media_feed: Option<AbortHandle>,
    has_calendar_events: bool,
}

impl PanelCore {
    pub fn new(
        config: Config,
        broadcast_tx: broadcast::Sender<PanelUpdate>,
        event_tx: mpsc::Sender<PanelEvent>,
        media: Arc<dyn MediaSource>,
        calendar: Arc<dyn CalendarSource>,
        pointer: Arc<dyn PointerSource>,
        host: Box<dyn WindowHost>,
    ) -> Self {
        let mode = config.interaction_mode();
        let sync = NowPlayingSync::new(event_tx.clone());
        let sizing = SizingDriver::new(
            Duration::from_millis(config.panel.resize_duration_ms),
            event_tx.clone(),
        );
        Self {
            config,
            mode,
            machine: PanelStateMachine::new(),
            sync,
            sizing,
            media,
            calendar,
            pointer,
            host,
            event_tx,
            broadcast_tx,
            pointer_task: None,
            media_feed: None,
            has_calendar_events: false,
        }
    }

    /// Run the control loop.  Returns when a `Shutdown` event arrives or
    /// the event channel closes.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<PanelEvent>) -> anyhow::Result<()> {
        info!("PanelCore: starting control loop");
        self.bootstrap();

        let period = Duration::from_secs(self.config.calendar.refresh_secs.max(1));
        let mut calendar_refresh =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        calendar_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                evt = event_rx.recv() => match evt {
                    None => {
                        info!("PanelCore: event channel closed, shutting down");
                        break;
                    }
                    Some(PanelEvent::Shutdown) => {
                        info!("PanelCore: shutdown requested");
                        break;
                    }
                    Some(evt) => self.handle_event(evt),
                },
                _ = calendar_refresh.tick() => {
                    self.calendar.refresh(self.event_tx.clone());
                }
            }
        }

        self.cleanup();
        Ok(())
    }

    /// Initial placement and collaborator kick-off.  The first layout is
    /// applied instantaneously; collaborators that are absent leave the
    /// panel in its "no media / no events" baseline.
    fn bootstrap(&mut self) {
        self.host.set_visible(true);
        self.resize_to_fit();
        self.retune_pointer_tracking();
        self.media_feed = self.media.start(self.event_tx.clone());
        self.media.query(self.event_tx.clone());
        self.calendar.refresh(self.event_tx.clone());
    }

    // ── event handler ─────────────────────────────────────────────────────────

    fn handle_event(&mut self, evt: PanelEvent) {
        match evt {
            PanelEvent::Pointer(sample) => self.handle_pointer(sample),
            PanelEvent::MediaChanged => self.media.query(self.event_tx.clone()),
            PanelEvent::MediaInfo(info) => self.handle_media_info(info),
            PanelEvent::PositionTick => {
                if let Some(pos) = self.sync.on_position_tick(Instant::now()) {
                    self.publish(PanelUpdate::PositionTick(pos));
                }
            }
            PanelEvent::AnimationTick => {
                if let Some(frame) = self.sizing.step(Instant::now()) {
                    self.host.apply_frame(frame);
                    self.publish(PanelUpdate::FrameChanged(frame));
                }
            }
            PanelEvent::CalendarEvents(events) => self.handle_calendar(events),
            PanelEvent::SettingsChanged(config) => self.handle_settings(config),
            PanelEvent::Command(cmd) => self.handle_command(cmd),
            PanelEvent::Shutdown => unreachable!("consumed by run()"),
        }
    }

    fn handle_pointer(&mut self, sample: PointerSample) {
        let state = self.machine.state();
        if !state.visible {
            return;
        }
        let zone = TriggerZone::new(
            self.config.panel.trigger_height,
            self.config.panel.trigger_half_width,
        );
        // `pinned` is read here, at evaluation time — never cached from
        // when the sample was taken.
        let decision = geometry::evaluate(
            sample.position,
            self.sizing.current_frame(),
            self.host.screen_frame(),
            state.pinned,
            self.mode,
            zone,
        );
        match decision {
            ExpansionDecision::Expand => {
                let t = self.machine.request_expand();
                self.apply_transitions(t.into_iter().collect());
            }
            ExpansionDecision::Collapse => {
                let t = self.machine.request_collapse();
                self.apply_transitions(t.into_iter().collect());
            }
            ExpansionDecision::Hold => {}
        }
    }

    fn handle_media_info(&mut self, info: Option<MediaInfo>) {
        let had_media = self.sync.has_media();
        let change = self.sync.apply(info, Instant::now());
        match change {
            SnapshotChange::TrackChanged => {
                info!(
                    "media: track → {:?}",
                    self.sync.snapshot().map(|s| s.title.as_str())
                );
                self.publish(PanelUpdate::NowPlayingUpdated(self.sync.snapshot().cloned()));
                // The pill is wider with media present; the expanded card is
                // not, but retargeting is cheap and a no-op when equal.
                if self.sync.has_media() != had_media {
                    self.resize_to_fit();
                }
            }
            SnapshotChange::Progress => {
                self.publish(PanelUpdate::NowPlayingUpdated(self.sync.snapshot().cloned()));
            }
            SnapshotChange::Unchanged => {}
        }
    }

    fn handle_calendar(&mut self, events: Vec<CalendarEvent>) {
        let has_events = !events.is_empty();
        if has_events != self.has_calendar_events {
            self.has_calendar_events = has_events;
            // Content size changed even without an expand/collapse
            // transition (tile appearing after events loaded).
            self.resize_to_fit();
        }
        self.publish(PanelUpdate::CalendarUpdated(Arc::new(events)));
    }

    fn handle_settings(&mut self, config: Config) {
        let new_mode = config.interaction_mode();
        let mode_changed = new_mode != self.mode;
        let cadence_changed = config.panel.pointer_poll_ms != self.config.panel.pointer_poll_ms;

        self.sizing
            .set_duration(Duration::from_millis(config.panel.resize_duration_ms));
        self.config = config;
        self.mode = new_mode;

        if mode_changed {
            info!("panel: interaction mode → {:?}", self.mode);
        }
        if mode_changed || cadence_changed {
            // Swap tracking regimes within this turn: the old sampler is
            // always torn down, a fresh one starts only if the new regime
            // needs it.  No window with both or neither running.
            self.stop_pointer_sampling();
            self.retune_pointer_tracking();
        }
    }

    fn handle_command(&mut self, cmd: PanelCommand) {
        debug!("panel: command {:?}", cmd);
        match cmd {
            PanelCommand::Expand => {
                let t = self.machine.request_expand();
                self.apply_transitions(t.into_iter().collect());
            }
            PanelCommand::Collapse => {
                let t = self.machine.request_collapse();
                self.apply_transitions(t.into_iter().collect());
            }
            PanelCommand::TogglePin => {
                let ts = self.machine.toggle_pin();
                self.apply_transitions(ts);
            }
            PanelCommand::ToggleVisibility => {
                let visible = !self.machine.state().visible;
                let t = self.machine.set_visible(visible);
                self.apply_transitions(t.into_iter().collect());
            }
            PanelCommand::Click => {
                if self.mode == InteractionMode::ClickToExpand && !self.machine.state().expanded {
                    let t = self.machine.request_expand();
                    self.apply_transitions(t.into_iter().collect());
                }
            }
            PanelCommand::TogglePlayPause => self.media.toggle_play_pause(),
            PanelCommand::NextTrack => self.media.next(),
            PanelCommand::PreviousTrack => self.media.previous(),
            PanelCommand::RefreshCalendar => self.calendar.refresh(self.event_tx.clone()),
        }
    }

    // ── transitions ───────────────────────────────────────────────────────────

    fn apply_transitions(&mut self, transitions: Vec<PanelTransition>) {
        let mut expansion_changed = false;
        let mut visibility_changed = false;
        for t in transitions {
            match t {
                PanelTransition::ExpansionChanged(v) => {
                    info!("panel: expanded → {}", v);
                    expansion_changed = true;
                    self.publish(PanelUpdate::ExpansionChanged(v));
                }
                PanelTransition::PinnedChanged(v) => {
                    info!("panel: pinned → {}", v);
                    self.publish(PanelUpdate::PinnedChanged(v));
                }
                PanelTransition::VisibilityChanged(v) => {
                    info!("panel: visible → {}", v);
                    visibility_changed = true;
                    self.host.set_visible(v);
                    self.publish(PanelUpdate::VisibilityChanged(v));
                }
            }
        }
        if expansion_changed {
            self.resize_to_fit();
        }
        if expansion_changed || visibility_changed {
            self.retune_pointer_tracking();
        }
    }

    fn resize_to_fit(&mut self) {
        let state = self.machine.state();
        let size = sizing::natural_size(
            state.expanded,
            self.sync.has_media(),
            self.has_calendar_events,
        );
        let target = sizing::target_frame(size, self.host.screen_frame());
        if let Some(frame) = self.sizing.retarget(target, Instant::now()) {
            self.host.apply_frame(frame);
            self.publish(PanelUpdate::FrameChanged(frame));
        }
    }

    // ── pointer tracking ──────────────────────────────────────────────────────

    /// Whether the current (mode, expanded, visible) regime needs the
    /// sampling timer.  Hover polls continuously — hover has no natural
    /// "end" event.  Click mode only needs leave-detection while expanded.
    fn pointer_regime_active(&self) -> bool {
        let state = self.machine.state();
        state.visible
            && match self.mode {
                InteractionMode::Hover => true,
                InteractionMode::ClickToExpand => state.expanded,
            }
    }

    fn retune_pointer_tracking(&mut self) {
        let desired = self.pointer_regime_active();
        match (desired, self.pointer_task.is_some()) {
            (true, false) => self.start_pointer_sampling(),
            (false, true) => self.stop_pointer_sampling(),
            _ => {}
        }
    }

    fn start_pointer_sampling(&mut self) {
        self.stop_pointer_sampling();
        let pointer = Arc::clone(&self.pointer);
        let tx = self.event_tx.clone();
        let period = Duration::from_millis(self.config.panel.pointer_poll_ms.max(1));
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let Some(position) = pointer.location() else {
                    continue;
                };
                let sample = PointerSample {
                    position,
                    at: Instant::now(),
                };
                if tx.send(PanelEvent::Pointer(sample)).await.is_err() {
                    break;
                }
            }
        });
        self.pointer_task = Some(handle.abort_handle());
        debug!("panel: pointer sampling started");
    }

    fn stop_pointer_sampling(&mut self) {
        if let Some(h) = self.pointer_task.take() {
            h.abort();
            debug!("panel: pointer sampling stopped");
        }
    }

    // ── helpers ───────────────────────────────────────────────────────────────

    fn publish(&self, update: PanelUpdate) {
        let _ = self.broadcast_tx.send(update);
    }

    fn cleanup(&mut self) {
        info!("PanelCore: cleanup — stopping periodic tasks");
        self.stop_pointer_sampling();
        self.sync.stop_ticker();
        self.sizing.stop();
        if let Some(h) = self.media_feed.take() {
            h.abort();
        }
    }
}
