// SPDX-License-Identifier: GPL-3.0-only

//! Cover selection: thumbnail strip and drag-to-scrub
//!
//! The strip shows `ceil(container_width / item_width)` evenly spaced frames.
//! A drag handle slides over it; releasing the handle maps its offset to a
//! timestamp and extracts one full-size cover candidate there. Until the
//! handle is first released, the frame at one second (or the end of shorter
//! clips) is the cover.

use super::extract::ExtractorSession;
use crate::backends::DecoderSession;
use crate::config::{Config, SelectionLimits};
use crate::constants::extraction;
use crate::errors::{ExtractError, ValidationError};
use crate::media::{
    Cover, MediaBlob, MediaDraft, MediaKind, Previews, SelectedFile, ThumbnailCandidate,
    VideoMeta, validate_single_image,
};
use tracing::{debug, info, warn};

/// Number of strip items for a container
///
/// Before the container has been measured the default count is used.
pub fn strip_count(container_width: Option<u32>, item_width: u32) -> usize {
    match container_width {
        Some(width) => width.div_ceil(item_width.max(1)) as usize,
        None => extraction::DEFAULT_STRIP_COUNT,
    }
}

/// Evenly spaced timestamps `D * i / count` for `i` in `0..count`
pub fn strip_timestamps(duration_secs: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| duration_secs * i as f64 / count as f64)
        .collect()
}

/// Horizontal range the drag handle may occupy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBounds {
    pub left: f64,
    pub right: f64,
}

impl DragBounds {
    /// `[0, container_width - handle_width]`
    pub fn new(container_width: u32, handle_width: u32) -> Self {
        Self {
            left: 0.0,
            right: container_width.saturating_sub(handle_width) as f64,
        }
    }

    /// Map a handle offset to a timestamp in `[0, duration]`
    pub fn offset_to_timestamp(&self, x: f64, duration_secs: f64) -> f64 {
        let span = self.right - self.left;
        if span <= 0.0 || x.is_nan() {
            return 0.0;
        }
        let fraction = ((x - self.left) / span).clamp(0.0, 1.0);
        fraction * duration_secs
    }
}

/// Strip geometry and quality settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripGeometry {
    pub item_width: u32,
    pub item_height: u32,
    pub handle_width: u32,
    pub quality: u8,
    pub cover_quality: u8,
}

impl From<&Config> for StripGeometry {
    fn from(config: &Config) -> Self {
        Self {
            item_width: config.strip_item_width,
            item_height: config.strip_item_height,
            handle_width: config.handle_width,
            quality: config.scrub_quality,
            cover_quality: config.cover_quality,
        }
    }
}

/// Strip of thumbnails plus the currently selected cover
pub struct ThumbnailScrubber {
    geometry: StripGeometry,
    previews: Previews,
    container_width: Option<u32>,
    duration_secs: Option<f64>,
    dirty: bool,
    strip: Vec<Option<ThumbnailCandidate>>,
    selected: Option<Cover>,
}

impl ThumbnailScrubber {
    pub fn new(geometry: StripGeometry, previews: Previews) -> Self {
        Self {
            geometry,
            previews,
            container_width: None,
            duration_secs: None,
            dirty: false,
            strip: Vec::new(),
            selected: None,
        }
    }

    // ===== Inputs =====

    /// Record the probed duration
    ///
    /// Only the first positive finite duration counts; later values are
    /// ignored. An empty clip cannot be scrubbed.
    pub fn set_duration(&mut self, meta: VideoMeta) {
        if self.duration_secs.is_some() {
            return;
        }
        match meta.duration_secs() {
            Some(duration) if duration > 0.0 => {
                self.duration_secs = Some(duration);
                self.dirty = true;
            }
            Some(duration) => debug!(duration, "Zero-length video, strip disabled"),
            None => {}
        }
    }

    /// Record the measured container width
    pub fn set_container_width(&mut self, width: u32) {
        if self.container_width != Some(width) {
            self.container_width = Some(width);
            self.dirty = true;
        }
    }

    /// Whether the strip is stale and a duration is known
    pub fn should_rebuild(&self) -> bool {
        self.dirty && self.duration_secs.is_some()
    }

    // ===== Strip =====

    pub fn count(&self) -> usize {
        strip_count(self.container_width, self.geometry.item_width)
    }

    pub fn timestamps(&self) -> Vec<f64> {
        match self.duration_secs {
            Some(duration) => strip_timestamps(duration, self.count()),
            None => Vec::new(),
        }
    }

    /// Extract every strip item sequentially
    ///
    /// A failed slot is logged and left empty. The old strip is released
    /// only once the new one is complete. If no cover has been chosen yet,
    /// the default cover frame is extracted afterwards.
    ///
    /// # Returns
    /// Number of slots that produced a thumbnail
    pub async fn build_strip<S: DecoderSession>(
        &mut self,
        session: &mut ExtractorSession<S>,
    ) -> usize {
        let timestamps = self.timestamps();
        let mut strip = Vec::with_capacity(timestamps.len());

        for (index, timestamp) in timestamps.into_iter().enumerate() {
            let result = session
                .extract_frame(
                    timestamp,
                    self.geometry.item_width,
                    self.geometry.item_height,
                    self.geometry.quality,
                )
                .await;
            match result {
                Ok(jpeg) => {
                    let image = MediaBlob::new(jpeg, "image/jpeg", format!("strip_{index}.jpeg"));
                    strip.push(Some(ThumbnailCandidate::new(timestamp, image, &self.previews)));
                }
                Err(e) => {
                    warn!(index, timestamp, error = %e, "Strip thumbnail failed");
                    strip.push(None);
                }
            }
        }

        let filled = strip.iter().filter(|slot| slot.is_some()).count();
        let previous = std::mem::replace(&mut self.strip, strip);
        drop(previous);
        self.dirty = false;

        info!(count = self.strip.len(), filled, "Thumbnail strip built");

        if self.selected.is_none() && filled > 0 {
            if let Some(duration) = self.duration_secs {
                let timestamp = extraction::DEFAULT_COVER_SECS.min(duration);
                match self.frame_cover(timestamp, session).await {
                    Ok(cover) => self.selected = Some(cover),
                    Err(e) => warn!(timestamp, error = %e, "Default cover failed"),
                }
            }
        }
        filled
    }

    pub fn strip(&self) -> &[Option<ThumbnailCandidate>] {
        &self.strip
    }

    // ===== Cover selection =====

    /// Drag range for the handle, `None` until the container is measured
    pub fn drag_bounds(&self) -> Option<DragBounds> {
        self.container_width
            .map(|width| DragBounds::new(width, self.geometry.handle_width))
    }

    /// Handle released at offset `x`: extract the cover candidate there
    pub async fn release_drag<S: DecoderSession>(
        &mut self,
        x: f64,
        session: &mut ExtractorSession<S>,
    ) -> Result<&Cover, ExtractError> {
        let duration = self.duration_secs.ok_or(ExtractError::DurationUnavailable)?;
        let bounds = self
            .drag_bounds()
            .unwrap_or_else(|| DragBounds::new(0, self.geometry.handle_width));
        let timestamp = bounds.offset_to_timestamp(x, duration);

        let cover = self.frame_cover(timestamp, session).await?;
        debug!(x, timestamp, "Cover candidate extracted");
        Ok(&*self.selected.insert(cover))
    }

    /// Full-size frame at `timestamp` wrapped as a cover
    async fn frame_cover<S: DecoderSession>(
        &self,
        timestamp: f64,
        session: &mut ExtractorSession<S>,
    ) -> Result<Cover, ExtractError> {
        let (width, height) = session.natural_size();
        let jpeg = session
            .extract_frame(timestamp, width, height, self.geometry.cover_quality)
            .await?;
        let image = MediaBlob::new(jpeg, "image/jpeg", "thumbnail.jpeg");
        let candidate = ThumbnailCandidate::new(timestamp, image, &self.previews);
        Ok(Cover::Frame(candidate))
    }

    /// Use a gallery image as the cover instead of a video frame
    pub fn select_local_cover(
        &mut self,
        files: Vec<SelectedFile>,
        limits: &SelectionLimits,
    ) -> Result<&Cover, ValidationError> {
        let image = validate_single_image(files, limits)?;
        debug!(name = image.name(), "Gallery cover selected");
        let draft = MediaDraft::new(MediaKind::Image, image, &self.previews);
        Ok(&*self.selected.insert(Cover::Gallery(draft)))
    }

    pub fn selected(&self) -> Option<&Cover> {
        self.selected.as_ref()
    }

    /// Hand the selected cover to the caller and release every strip handle
    pub fn promote_cover(&mut self) -> Option<Cover> {
        let cover = self.selected.take()?;
        self.strip.clear();
        self.dirty = true;
        Some(cover)
    }
}
