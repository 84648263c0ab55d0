//! Media-remote seam and the `nowplaying-cli` reference backend.
//!
//! The helper binary is polled for change detection and queried for the full
//! now-playing record.  Transport commands are fire-and-forget: nothing
//! waits for or verifies their effect — the next poll cycle reconciles
//! displayed state with reality.

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use islet_core::nowplaying::MediaInfo;
use islet_core::{config::Config, platform};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::core::PanelEvent;

/// Narrow interface over the OS media-remote integration.
///
/// All answers are marshalled back onto the control loop as [`PanelEvent`]s;
/// none of the methods block.
pub trait MediaSource: Send + Sync + 'static {
    /// Start the change-notification feed.  Returns the feed task's handle
    /// so the loop can tear it down, or `None` when the backend is
    /// unavailable (the panel then stays in its "no media" baseline).
    fn start(&self, events: mpsc::Sender<PanelEvent>) -> Option<AbortHandle>;

    /// Ask for the current now-playing record; the answer arrives later as
    /// `PanelEvent::MediaInfo`.  No timeout: an unanswered query simply
    /// leaves the snapshot untouched.
    fn query(&self, reply: mpsc::Sender<PanelEvent>);

    fn toggle_play_pause(&self);
    fn next(&self);
    fn previous(&self);
}

#[derive(Debug, Error)]
pub enum MediaHelperError {
    #[error("media helper failed to run: {0}")]
    Io(#[from] std::io::Error),
    #[error("media helper exited with {0}")]
    Failed(std::process::ExitStatus),
    #[error("unexpected helper output: {0}")]
    Malformed(String),
}

/// `nowplaying-cli` subprocess backend.
pub struct NowPlayingCli {
    binary: Option<PathBuf>,
    poll_interval: Duration,
}

/// Keys requested from the helper, one output line each, in this order.
const QUERY_KEYS: [&str; 6] = [
    "title",
    "artist",
    "playbackRate",
    "duration",
    "elapsedTime",
    "artworkData",
];

impl NowPlayingCli {
    pub fn discover(config: &Config) -> Self {
        let binary = platform::find_nowplaying_binary();
        match &binary {
            Some(p) => info!("media: using helper {}", p.display()),
            None => warn!("media: nowplaying-cli not found, panel will show no media"),
        }
        Self {
            binary,
            poll_interval: Duration::from_millis(config.media.poll_interval_ms),
        }
    }

    fn send_command(&self, subcommand: &'static str) {
        let Some(bin) = self.binary.clone() else {
            return;
        };
        tokio::spawn(async move {
            debug!("media: sending {}", subcommand);
            match tokio::process::Command::new(&bin)
                .arg(subcommand)
                .output()
                .await
            {
                Ok(out) if !out.status.success() => {
                    debug!("media: {} exited with {}", subcommand, out.status);
                }
                Ok(_) => {}
                Err(e) => debug!("media: failed to spawn {}: {}", subcommand, e),
            }
        });
    }
}

impl MediaSource for NowPlayingCli {
    fn start(&self, events: mpsc::Sender<PanelEvent>) -> Option<AbortHandle> {
        self.binary.as_ref()?;
        let interval = self.poll_interval;
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                if events.send(PanelEvent::MediaChanged).await.is_err() {
                    break;
                }
            }
        });
        Some(handle.abort_handle())
    }

    fn query(&self, reply: mpsc::Sender<PanelEvent>) {
        let Some(bin) = self.binary.clone() else {
            let _ = reply.try_send(PanelEvent::MediaInfo(None));
            return;
        };
        tokio::spawn(async move {
            let info = match run_query(&bin).await {
                Ok(info) => Some(info),
                Err(e) => {
                    debug!("media: query failed: {}", e);
                    None
                }
            };
            let _ = reply.send(PanelEvent::MediaInfo(info)).await;
        });
    }

    fn toggle_play_pause(&self) {
        self.send_command("togglePlayPause");
    }

    fn next(&self) {
        self.send_command("next");
    }

    fn previous(&self) {
        self.send_command("previous");
    }
}

async fn run_query(bin: &PathBuf) -> Result<MediaInfo, MediaHelperError> {
    let out = tokio::process::Command::new(bin)
        .arg("get")
        .args(QUERY_KEYS)
        .output()
        .await?;
    if !out.status.success() {
        return Err(MediaHelperError::Failed(out.status));
    }
    parse_info(&String::from_utf8_lossy(&out.stdout))
}

/// Parse the helper's line-per-key answer.  The literal `null` marks an
/// absent value.
fn parse_info(stdout: &str) -> Result<MediaInfo, MediaHelperError> {
    let mut lines = stdout.lines().map(str::trim);

    let title = opt_string(lines.next().unwrap_or("null"));
    let artist = opt_string(lines.next().unwrap_or("null"));
    let playback_rate = parse_number(lines.next().unwrap_or("null"))?;
    let duration_secs = parse_number(lines.next().unwrap_or("null"))?;
    let elapsed_secs = parse_number(lines.next().unwrap_or("null"))?;
    let artwork = opt_string(lines.next().unwrap_or("null")).and_then(|b64| {
        base64::engine::general_purpose::STANDARD
            .decode(b64.as_bytes())
            .map_err(|e| debug!("media: undecodable artwork: {}", e))
            .ok()
    });

    Ok(MediaInfo {
        title,
        artist,
        artwork,
        playback_rate,
        duration_secs,
        elapsed_secs,
    })
}

fn opt_string(line: &str) -> Option<String> {
    if line.is_empty() || line == "null" {
        None
    } else {
        Some(line.to_string())
    }
}

fn parse_number(line: &str) -> Result<f64, MediaHelperError> {
    if line.is_empty() || line == "null" {
        return Ok(0.0);
    }
    line.parse::<f64>()
        .map_err(|_| MediaHelperError::Malformed(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_answer() {
        let art = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let text = format!("Song Title\nThe Artist\n1\n213.5\n42.25\n{art}\n");
        let info = parse_info(&text).unwrap();
        assert_eq!(info.title.as_deref(), Some("Song Title"));
        assert_eq!(info.artist.as_deref(), Some("The Artist"));
        assert_eq!(info.playback_rate, 1.0);
        assert_eq!(info.duration_secs, 213.5);
        assert_eq!(info.elapsed_secs, 42.25);
        assert_eq!(info.artwork.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn parse_no_media_answer() {
        let info = parse_info("null\nnull\nnull\nnull\nnull\nnull\n").unwrap();
        assert!(info.title.is_none());
        assert!(info.artist.is_none());
        assert!(info.artwork.is_none());
        assert_eq!(info.playback_rate, 0.0);
    }

    #[test]
    fn parse_short_answer_treats_missing_as_null() {
        let info = parse_info("Song\n").unwrap();
        assert_eq!(info.title.as_deref(), Some("Song"));
        assert!(info.artist.is_none());
        assert_eq!(info.duration_secs, 0.0);
    }

    #[test]
    fn parse_garbage_rate_is_malformed() {
        let err = parse_info("Song\nArtist\nfast\n100\n1\nnull\n").unwrap_err();
        assert!(matches!(err, MediaHelperError::Malformed(_)));
    }

    #[test]
    fn bad_artwork_is_dropped_not_fatal() {
        let info = parse_info("Song\nArtist\n1\n100\n1\n!!!not-base64!!!\n").unwrap();
        assert_eq!(info.title.as_deref(), Some("Song"));
        assert!(info.artwork.is_none());
    }
}
