use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::SeekMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// How often the position/duration display refreshes while playing.
    pub tick_interval_ms: u64,
    /// Volume applied at start-up and whenever playback is stopped.
    pub default_volume: u8,
    pub start_muted: bool,
    pub seek_mode: SeekMode,
    /// Inspect the streams of every newly opened source.
    pub show_stream_info: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 300,
            default_volume: 50,
            start_muted: false,
            seek_mode: SeekMode::KeyUnit,
            show_stream_info: true,
        }
    }
}

impl PlayerConfig {
    pub const MIN_TICK_INTERVAL_MS: u64 = 20;

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config.validated())
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), using defaults", e);
                    Ok(Self::default())
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("multi-player")
            .join("config.json")
    }

    /// Pulls hand-edited values back into range.
    pub fn validated(mut self) -> Self {
        if self.default_volume > 100 {
            log::warn!("default_volume {} out of range, clamping to 100", self.default_volume);
            self.default_volume = 100;
        }
        if self.tick_interval_ms < Self::MIN_TICK_INTERVAL_MS {
            log::warn!(
                "tick_interval_ms {} too small, using {}",
                self.tick_interval_ms,
                Self::MIN_TICK_INTERVAL_MS
            );
            self.tick_interval_ms = Self::MIN_TICK_INTERVAL_MS;
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
