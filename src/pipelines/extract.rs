// SPDX-License-Identifier: GPL-3.0-only

//! Duration probing and frame extraction
//!
//! Decoders may report an indeterminate duration (infinity or NaN) for
//! streamed containers such as freshly recorded clips. The probe works
//! around this by seeking far past the end, which forces the decoder to
//! scan the stream, then reading the duration once it has materialized.
//!
//! Every wait on a decoder completion is bounded by the probe timeout.

use crate::backends::{DecoderEvent, DecoderSession, VideoDecoder};
use crate::constants::{JpegQuality, extraction};
use crate::errors::ExtractError;
use crate::media::{MediaBlob, Surface, VideoMeta};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which completion a wait is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    LoadedMetadata,
    TimeUpdate,
    Seeked,
}

impl Completion {
    fn label(self) -> &'static str {
        match self {
            Completion::LoadedMetadata => "metadata",
            Completion::TimeUpdate => "time update",
            Completion::Seeked => "seek",
        }
    }

    fn matches(self, event: &DecoderEvent) -> bool {
        matches!(
            (self, event),
            (Completion::LoadedMetadata, DecoderEvent::LoadedMetadata)
                | (Completion::TimeUpdate, DecoderEvent::TimeUpdate)
                | (Completion::Seeked, DecoderEvent::Seeked)
        )
    }
}

/// Wait for a completion event, skipping unrelated ones
async fn wait_for<S: DecoderSession>(
    session: &mut S,
    completion: Completion,
) -> Result<(), ExtractError> {
    loop {
        match session.next_event().await {
            Some(DecoderEvent::Error(msg)) => return Err(ExtractError::Decoder(msg)),
            Some(event) if completion.matches(&event) => return Ok(()),
            Some(_) => {}
            None => return Err(ExtractError::Closed(completion.label())),
        }
    }
}

/// Wait for a completion event within `timeout`
async fn wait_for_within<S: DecoderSession>(
    session: &mut S,
    completion: Completion,
    timeout: Duration,
) -> Result<(), ExtractError> {
    tokio::time::timeout(timeout, wait_for(session, completion))
        .await
        .map_err(|_| ExtractError::Timeout(timeout, completion.label()))?
}

/// Run the metadata / recovery protocol on an open session
///
/// # Returns
/// The finite duration in seconds
async fn resolve_duration<S: DecoderSession>(session: &mut S) -> Result<f64, ExtractError> {
    wait_for(session, Completion::LoadedMetadata).await?;

    let reported = session.duration();
    if reported.is_finite() {
        session.seek(0.0);
        return Ok(reported);
    }

    debug!(reported, "Indeterminate duration, seeking past the end");
    session.seek(extraction::PAST_END_SECS);
    wait_for(session, Completion::TimeUpdate).await?;
    session.seek(0.0);

    let recovered = session.duration();
    if recovered.is_finite() {
        Ok(recovered)
    } else {
        Err(ExtractError::DurationUnavailable)
    }
}

/// Opens decoder sessions and runs the extraction protocols on them
#[derive(Debug, Clone)]
pub struct FrameExtractor<D> {
    decoder: D,
    timeout: Duration,
}

impl<D: VideoDecoder> FrameExtractor<D> {
    pub fn new(decoder: D, timeout: Duration) -> Self {
        Self { decoder, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Determine the true duration of a video
    ///
    /// Never fails: a timeout, a decoder error or a duration that stays
    /// non-finite after recovery all resolve to [`VideoMeta::Unavailable`].
    /// The decoder session is closed before returning.
    pub async fn probe_duration(&self, blob: &MediaBlob) -> VideoMeta {
        let mut session = match self.decoder.open(blob) {
            Ok(session) => session,
            Err(e) => {
                warn!(name = blob.name(), error = %e, "Failed to open video for probing");
                return VideoMeta::Unavailable;
            }
        };

        let result = tokio::time::timeout(self.timeout, resolve_duration(&mut session)).await;
        session.close();

        match result {
            Ok(Ok(duration_secs)) => {
                info!(name = blob.name(), duration_secs, "Probed video duration");
                VideoMeta::from_secs(duration_secs)
            }
            Ok(Err(e)) => {
                warn!(name = blob.name(), error = %e, "Duration probe failed");
                VideoMeta::Unavailable
            }
            Err(_) => {
                warn!(
                    name = blob.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Duration probe timed out"
                );
                VideoMeta::Unavailable
            }
        }
    }

    /// Open an extraction session over a video
    ///
    /// Waits for the decoder to report metadata so that no seek is issued
    /// before the source is ready. `duration_secs` is the probed duration
    /// used to clamp timestamps.
    pub async fn open(
        &self,
        blob: &MediaBlob,
        duration_secs: Option<f64>,
    ) -> Result<ExtractorSession<D::Session>, ExtractError> {
        let mut session = self.decoder.open(blob)?;
        if let Err(e) =
            wait_for_within(&mut session, Completion::LoadedMetadata, self.timeout).await
        {
            warn!(name = blob.name(), error = %e, "Video never became ready for extraction");
            session.close();
            return Err(e);
        }
        Ok(ExtractorSession {
            session,
            surface: Surface::new(),
            timeout: self.timeout,
            duration_secs,
        })
    }

    /// Extract one full-size cover frame at default quality
    pub async fn capture_cover(
        &self,
        blob: &MediaBlob,
        timestamp_secs: f64,
        duration_secs: Option<f64>,
    ) -> Result<Vec<u8>, ExtractError> {
        let mut session = self.open(blob, duration_secs).await?;
        let (width, height) = session.natural_size();
        session
            .extract_frame(timestamp_secs, width, height, JpegQuality::Cover.value())
            .await
    }
}

/// One open source for sequential frame extraction
///
/// Extraction takes `&mut self`, so seeks on the same source never overlap.
/// The drawing surface is reused across calls. Dropping the session closes
/// the decoder.
pub struct ExtractorSession<S: DecoderSession> {
    session: S,
    surface: Surface,
    timeout: Duration,
    duration_secs: Option<f64>,
}

impl<S: DecoderSession> ExtractorSession<S> {
    /// Natural frame size of the source
    pub fn natural_size(&self) -> (u32, u32) {
        self.session.natural_size()
    }

    /// Clamp a requested timestamp into `[0, duration]`
    pub fn clamp_timestamp(&self, timestamp_secs: f64) -> f64 {
        let t = if timestamp_secs.is_nan() {
            0.0
        } else {
            timestamp_secs.max(0.0)
        };
        match self.duration_secs {
            Some(duration) => t.min(duration),
            None => t,
        }
    }

    /// Render the frame at `timestamp_secs` into a `width × height` JPEG
    ///
    /// # Arguments
    /// * `timestamp_secs` - Clamped to `[0, duration]`
    /// * `width`, `height` - Output size in pixels
    /// * `quality` - JPEG quality 1-100
    pub async fn extract_frame(
        &mut self,
        timestamp_secs: f64,
        width: u32,
        height: u32,
        quality: u8,
    ) -> Result<Vec<u8>, ExtractError> {
        let target = self.clamp_timestamp(timestamp_secs);
        self.session.seek(target);
        wait_for_within(&mut self.session, Completion::Seeked, self.timeout).await?;

        let frame = self
            .session
            .current_frame()
            .ok_or(ExtractError::NoFrame(target))?;
        self.surface.draw(&frame, width, height)?;
        let jpeg = self.surface.encode_jpeg(quality)?;

        debug!(
            timestamp_secs = target,
            width,
            height,
            quality,
            bytes = jpeg.len(),
            "Extracted frame"
        );
        Ok(jpeg)
    }
}

impl<S: DecoderSession> Drop for ExtractorSession<S> {
    fn drop(&mut self) {
        self.session.close();
    }
}
