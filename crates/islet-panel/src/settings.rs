//! Config-file watcher — the interaction-mode change source.
//!
//! The settings UI (an excluded collaborator) persists preferences by
//! rewriting `config.toml`; we watch the file and push the freshly loaded
//! config into the control loop.  The loop compares modes itself, so
//! redundant change events are harmless.

use islet_core::config::Config;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::PanelEvent;

/// Start watching the config file.  The returned watcher must be kept
/// alive for the lifetime of the panel; dropping it stops the feed.
pub fn spawn_config_watcher(
    event_tx: mpsc::Sender<PanelEvent>,
) -> anyhow::Result<RecommendedWatcher> {
    let config_path = Config::config_path();
    let watch_dir = config_path
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| config_path.clone());
    std::fs::create_dir_all(&watch_dir)?;

    // notify calls back on its own thread; reload there and marshal the
    // result onto the control loop.
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("settings: watch error: {}", e);
                return;
            }
        };
        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name() == config_path.file_name());
        if !touches_config {
            return;
        }
        match Config::load() {
            Ok(config) => {
                debug!("settings: config reloaded");
                let _ = event_tx.blocking_send(PanelEvent::SettingsChanged(config));
            }
            Err(e) => warn!("settings: reload failed, keeping current: {}", e),
        }
    })?;

    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
