// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{FacingMode, extraction, gesture, recording, selection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory name under the user config dir
const CONFIG_DIR_NAME: &str = "postcam";
/// Config file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Gallery selection limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionLimits {
    /// Maximum number of images per post
    pub max_images: usize,
    /// Per-image size limit in bytes
    pub image_size_limit: u64,
    /// Video size limit in bytes
    pub video_size_limit: u64,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_images: selection::MAX_IMAGES,
            image_size_limit: selection::IMAGE_SIZE_LIMIT,
            video_size_limit: selection::VIDEO_SIZE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Press length that turns a tap into a long press (milliseconds)
    pub long_press_ms: u64,
    /// Recording cap in seconds
    pub max_recording_secs: u32,
    /// Upper bound for duration probes and seeks (milliseconds)
    pub probe_timeout_ms: u64,
    /// Scrub strip item width in pixels
    pub strip_item_width: u32,
    /// Scrub strip item height in pixels
    pub strip_item_height: u32,
    /// Drag handle width in pixels
    pub handle_width: u32,
    /// JPEG quality for strip thumbnails
    pub scrub_quality: u8,
    /// JPEG quality for the cover frame
    pub cover_quality: u8,
    /// Camera opened when capture starts
    pub default_facing: FacingMode,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Gallery selection limits
    pub limits: SelectionLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            long_press_ms: gesture::LONG_PRESS_THRESHOLD.as_millis() as u64,
            max_recording_secs: recording::MAX_DURATION_SECS,
            probe_timeout_ms: extraction::PROBE_TIMEOUT.as_millis() as u64,
            strip_item_width: extraction::STRIP_ITEM_WIDTH,
            strip_item_height: extraction::STRIP_ITEM_HEIGHT,
            handle_width: extraction::HANDLE_WIDTH,
            scrub_quality: crate::constants::JpegQuality::Scrub.value(),
            cover_quality: crate::constants::JpegQuality::Cover.value(),
            default_facing: FacingMode::User,
            mirror_preview: true, // Default to mirrored (selfie mode)
            limits: SelectionLimits::default(),
        }
    }
}

impl Config {
    /// Long-press threshold as a Duration
    pub fn long_press_threshold(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    /// Probe/seek timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load config from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from a specific file
    ///
    /// A missing file yields defaults. A malformed file is logged and
    /// replaced by defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config.sanitized()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Write config to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> crate::errors::AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::errors::AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp values that would break the pipelines
    fn sanitized(mut self) -> Self {
        self.max_recording_secs = self.max_recording_secs.max(1);
        self.strip_item_width = self.strip_item_width.max(1);
        self.strip_item_height = self.strip_item_height.max(1);
        self.scrub_quality = self.scrub_quality.clamp(1, 100);
        self.cover_quality = self.cover_quality.clamp(1, 100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = std::env::temp_dir().join(format!("postcam-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, r#"{ "max_recording_secs": 29 }"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.max_recording_secs, 29);
        assert_eq!(config.long_press_ms, 500);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("postcam-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("postcam-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join(CONFIG_FILE_NAME);
        let config = Config {
            default_facing: FacingMode::Environment,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
