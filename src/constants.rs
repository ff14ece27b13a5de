// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which physical camera to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FacingMode {
    /// Front camera (selfie)
    #[default]
    User,
    /// Rear camera
    Environment,
}

impl FacingMode {
    /// The other camera
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    /// Get display name for the facing mode
    pub fn display_name(&self) -> &'static str {
        match self {
            FacingMode::User => "Front",
            FacingMode::Environment => "Rear",
        }
    }
}

/// JPEG quality presets for frame extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JpegQuality {
    /// Small scrub strip thumbnails
    Scrub,
    /// Full-size cover frame (encoder default)
    #[default]
    Cover,
}

impl JpegQuality {
    /// Get JPEG quality value (1-100)
    pub fn value(&self) -> u8 {
        match self {
            JpegQuality::Scrub => 50,
            JpegQuality::Cover => 92,
        }
    }
}

/// Gesture timing
pub mod gesture {
    use super::Duration;

    /// Press duration at which a press becomes a long press
    pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(500);
}

/// Recording limits
pub mod recording {
    use super::Duration;

    /// Maximum recording length in seconds (advertised as 15, minus one)
    pub const MAX_DURATION_SECS: u32 = 14;

    /// Progress ticker granularity
    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

    /// MIME type tag of recorded clips
    pub const MIME_TYPE: &str = "video/mp4";

    /// File name given to recorded clips on hand-off
    pub const FILE_NAME: &str = "video.mp4";
}

/// Gallery selection limits
pub mod selection {
    /// Maximum number of images in one post
    pub const MAX_IMAGES: usize = 10;

    /// Per-image size limit (5 MiB)
    pub const IMAGE_SIZE_LIMIT: u64 = 5 * 1024 * 1024;

    /// Video size limit (100 MiB)
    pub const VIDEO_SIZE_LIMIT: u64 = 100 * 1024 * 1024;

    /// MIME prefix accepted for images
    pub const IMAGE_MIME_PREFIX: &str = "image";

    /// MIME prefix accepted for videos
    pub const VIDEO_MIME_PREFIX: &str = "video";
}

/// Frame extraction timing and geometry
pub mod extraction {
    use super::Duration;

    /// Upper bound for any single probe or seek completion
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Seek target used to force an indeterminate duration to materialize
    pub const PAST_END_SECS: f64 = 1e101;

    /// Scrub strip item width in pixels
    pub const STRIP_ITEM_WIDTH: u32 = 34;

    /// Scrub strip item height in pixels
    pub const STRIP_ITEM_HEIGHT: u32 = 44;

    /// Drag handle width in pixels
    pub const HANDLE_WIDTH: u32 = 36;

    /// Strip size used before the container has been measured
    pub const DEFAULT_STRIP_COUNT: usize = 9;

    /// Timestamp of the cover shown before the user picks one
    pub const DEFAULT_COVER_SECS: f64 = 1.0;
}

/// Supported file formats for gallery input from disk
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Supported video file extensions
    pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "avi", "synv"];

    /// Check if extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext)
    }

    /// Check if extension is a supported video format
    pub fn is_video_extension(ext: &str) -> bool {
        VIDEO_EXTENSIONS.contains(&ext)
    }

    /// Guess a MIME type from a lowercase file extension
    pub fn mime_for_extension(ext: &str) -> &'static str {
        match ext {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "mov" => "video/quicktime",
            "avi" => "video/x-msvideo",
            "synv" => crate::backends::synthetic::SYNTHETIC_MIME,
            _ => "application/octet-stream",
        }
    }
}

/// Format elapsed recording seconds for display (e.g., "00:07")
pub fn format_elapsed(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
