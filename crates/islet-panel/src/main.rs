//! islet — headless harness for the island panel controller.
//!
//! The real menu-bar app links `islet-panel` as a library, provides its own
//! AppKit `WindowHost`, and feeds gestures in as `PanelCommand`s.  This
//! binary runs the same control loop against the reference backends with a
//! logging host — enough to watch the panel's behavior (expansion, media
//! sync, sizing) from the log file alone.

use std::sync::Arc;

use islet_panel::calendar::IcalBuddy;
use islet_panel::core::{PanelCore, PanelEvent};
use islet_panel::host::HeadlessHost;
use islet_panel::media::NowPlayingCli;
use islet_panel::{settings, PanelUpdate};
use tokio::sync::{broadcast, mpsc};

#[cfg(target_os = "macos")]
use islet_panel::pointer::QuartzPointer;

#[cfg(not(target_os = "macos"))]
use islet_panel::pointer::NullPointer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = islet_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("panel.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("islet log: {}", log_path.display());

    tracing::info!("islet starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = islet_core::config::Config::load().unwrap_or_default();

    // ── Channels ─────────────────────────────────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<PanelUpdate>(1024);
    let (event_tx, event_rx) = mpsc::channel::<PanelEvent>(1024);

    // ── Collaborators ────────────────────────────────────────────────────────
    let media = Arc::new(NowPlayingCli::discover(&config));
    let calendar = Arc::new(IcalBuddy::discover(&config));
    #[cfg(target_os = "macos")]
    let pointer = Arc::new(QuartzPointer);
    #[cfg(not(target_os = "macos"))]
    let pointer = Arc::new(NullPointer);
    let host = Box::new(HeadlessHost::default());

    // ── Settings watcher (interaction-mode change source) ────────────────────
    let _watcher = match settings::spawn_config_watcher(event_tx.clone()) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!("settings: watcher unavailable: {}", e);
            None
        }
    };

    // ── Log broadcasts so the harness is observable ──────────────────────────
    tokio::spawn(async move {
        let mut rx = broadcast_rx;
        loop {
            match rx.recv().await {
                Ok(PanelUpdate::PositionTick(pos)) => {
                    tracing::debug!("update: position {:.1}s", pos)
                }
                Ok(update) => tracing::info!("update: {:?}", update),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("update receiver lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // ── Ctrl-C → clean shutdown ──────────────────────────────────────────────
    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(PanelEvent::Shutdown).await;
        }
    });

    // ── Run the control loop ─────────────────────────────────────────────────
    let core = PanelCore::new(
        config,
        broadcast_tx,
        event_tx,
        media,
        calendar,
        pointer,
        host,
    );
    core.run(event_rx).await?;

    tracing::info!("islet stopped");
    Ok(())
}
