use serde::{Deserialize, Serialize};

use super::platform;
use crate::panel::InteractionMode;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// The persisted interaction-mode preference: when true the panel only
    /// expands on an explicit click.
    #[serde(default)]
    pub require_click_to_expand: bool,
    /// Height of the hover band at the top of the screen, in px.
    #[serde(default = "default_trigger_height")]
    pub trigger_height: f64,
    /// Half-width of the hover band around the screen midpoint, in px.
    #[serde(default = "default_trigger_half_width")]
    pub trigger_half_width: f64,
    /// Pointer sampling cadence.
    #[serde(default = "default_pointer_poll_ms")]
    pub pointer_poll_ms: u64,
    /// Duration of the expand/collapse resize animation.
    #[serde(default = "default_resize_duration_ms")]
    pub resize_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// How often the media helper is polled for change detection.
    #[serde(default = "default_media_poll_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// How far ahead to look for events.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
    /// Calendar refresh cadence.
    #[serde(default = "default_calendar_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            require_click_to_expand: false,
            trigger_height: default_trigger_height(),
            trigger_half_width: default_trigger_half_width(),
            pointer_poll_ms: default_pointer_poll_ms(),
            resize_duration_ms: default_resize_duration_ms(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_media_poll_ms(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            lookahead_days: default_lookahead_days(),
            refresh_secs: default_calendar_refresh_secs(),
        }
    }
}

fn default_trigger_height() -> f64 {
    30.0
}

fn default_trigger_half_width() -> f64 {
    170.0
}

fn default_pointer_poll_ms() -> u64 {
    100
}

fn default_resize_duration_ms() -> u64 {
    300
}

fn default_media_poll_ms() -> u64 {
    2000
}

fn default_lookahead_days() -> u32 {
    7
}

fn default_calendar_refresh_secs() -> u64 {
    300
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> std::path::PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        InteractionMode::from_require_click(self.panel.require_click_to_expand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.panel.require_click_to_expand);
        assert_eq!(config.panel.trigger_height, 30.0);
        assert_eq!(config.panel.trigger_half_width, 170.0);
        assert_eq!(config.panel.pointer_poll_ms, 100);
        assert_eq!(config.media.poll_interval_ms, 2000);
        assert_eq!(config.calendar.lookahead_days, 7);
        assert_eq!(config.interaction_mode(), InteractionMode::Hover);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [panel]
            require_click_to_expand = true
            "#,
        )
        .unwrap();
        assert_eq!(config.interaction_mode(), InteractionMode::ClickToExpand);
        assert_eq!(config.panel.trigger_height, 30.0);
        assert_eq!(config.media.poll_interval_ms, 2000);
    }

    #[test]
    fn test_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(
            back.panel.require_click_to_expand,
            config.panel.require_click_to_expand
        );
        assert_eq!(back.panel.resize_duration_ms, config.panel.resize_duration_ms);
    }
}
