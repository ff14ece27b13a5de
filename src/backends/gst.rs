// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer video decoder
//!
//! Media bytes are spooled to a temporary file and decoded with
//! `filesrc ! decodebin ! videoconvert ! appsink`. The pipeline stays
//! paused; each flushing seek prerolls the frame at the new position into
//! the appsink, and the bus `AsyncDone` message is the seek completion.

use super::decoder::{DecoderEvent, DecoderSession, VideoDecoder};
use crate::errors::ExtractError;
use crate::media::{MediaBlob, VideoFrame};
use gstreamer::prelude::*;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bus polling interval while waiting for completions
const BUS_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for a prerolled sample after a completed seek
const PREROLL_TIMEOUT_MS: u64 = 500;

/// Decoder backed by a GStreamer pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct GstDecoder;

impl VideoDecoder for GstDecoder {
    type Session = GstSession;

    fn open(&self, blob: &MediaBlob) -> Result<GstSession, ExtractError> {
        gstreamer::init().map_err(|e| ExtractError::Open(format!("GStreamer init failed: {}", e)))?;

        let mut file = tempfile::Builder::new()
            .prefix("postcam-")
            .tempfile()
            .map_err(|e| ExtractError::Open(format!("Failed to create spool file: {}", e)))?;
        file.write_all(blob.bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ExtractError::Open(format!("Failed to spool media: {}", e)))?;

        let (pipeline, appsink) = create_pipeline(file.path())?;
        pipeline
            .set_state(gstreamer::State::Paused)
            .map_err(|e| ExtractError::Open(format!("Failed to pause pipeline: {:?}", e)))?;

        info!(name = blob.name(), size = blob.len(), "GStreamer session opened");
        Ok(GstSession {
            pipeline,
            appsink,
            _spool: file,
            pending: VecDeque::new(),
            metadata_loaded: false,
            seeking: false,
            closed: false,
        })
    }
}

/// Create the frame extraction pipeline with its appsink
fn create_pipeline(
    path: &std::path::Path,
) -> Result<(gstreamer::Pipeline, gstreamer_app::AppSink), ExtractError> {
    let pipeline_str = format!(
        "filesrc location=\"{}\" ! decodebin ! \
         videoconvert ! video/x-raw,format=RGBA ! \
         appsink name=sink max-buffers=1 sync=false",
        path.to_string_lossy()
    );

    let pipeline = gstreamer::parse::launch(&pipeline_str)
        .map_err(|e| ExtractError::Open(format!("Failed to create pipeline: {}", e)))?
        .downcast::<gstreamer::Pipeline>()
        .map_err(|_| ExtractError::Open("Failed to downcast to Pipeline".into()))?;

    let appsink = pipeline
        .by_name("sink")
        .ok_or_else(|| ExtractError::Open("Failed to find appsink".into()))?
        .downcast::<gstreamer_app::AppSink>()
        .map_err(|_| ExtractError::Open("Failed to downcast to AppSink".into()))?;

    Ok((pipeline, appsink))
}

/// Convert a prerolled sample into a frame, honoring the row stride
fn frame_from_sample(sample: &gstreamer::Sample) -> Option<VideoFrame> {
    let caps = sample.caps()?;
    let info = gstreamer_video::VideoInfo::from_caps(caps).ok()?;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;
    let stride = info.stride().first().copied().unwrap_or(0).max(0) as u32;

    Some(VideoFrame {
        width: info.width(),
        height: info.height(),
        stride: stride.max(info.width() * 4),
        data: Arc::from(map.as_slice()),
    })
}

/// One paused GStreamer pipeline
pub struct GstSession {
    pipeline: gstreamer::Pipeline,
    appsink: gstreamer_app::AppSink,
    _spool: tempfile::NamedTempFile,
    pending: VecDeque<DecoderEvent>,
    metadata_loaded: bool,
    seeking: bool,
    closed: bool,
}

impl GstSession {
    fn preroll_frame(&self) -> Option<VideoFrame> {
        let sample = self
            .appsink
            .try_pull_preroll(gstreamer::ClockTime::from_mseconds(PREROLL_TIMEOUT_MS))?;
        frame_from_sample(&sample)
    }
}

impl DecoderSession for GstSession {
    fn duration(&self) -> f64 {
        self.pipeline
            .query_duration::<gstreamer::ClockTime>()
            .map(|d| d.nseconds() as f64 / 1_000_000_000.0)
            .unwrap_or(f64::INFINITY)
    }

    fn natural_size(&self) -> (u32, u32) {
        self.preroll_frame()
            .map(|frame| (frame.width, frame.height))
            .unwrap_or((0, 0))
    }

    fn seek(&mut self, position_secs: f64) {
        if self.closed {
            return;
        }
        let duration = self.duration();
        let target = if position_secs.is_nan() {
            0.0
        } else if duration.is_finite() {
            position_secs.clamp(0.0, duration)
        } else {
            position_secs.max(0.0)
        };
        // Unknown duration and an unbounded target: seek to the segment end
        let position = if target.is_finite() && target < u64::MAX as f64 / 1e9 {
            gstreamer::ClockTime::from_nseconds((target * 1_000_000_000.0) as u64)
        } else {
            gstreamer::ClockTime::MAX
        };

        debug!(position_secs = target, "Seeking");
        match self.pipeline.seek_simple(
            gstreamer::SeekFlags::FLUSH | gstreamer::SeekFlags::ACCURATE,
            position,
        ) {
            Ok(()) => self.seeking = true,
            Err(e) => {
                warn!(?e, "Seek failed");
                self.pending
                    .push_back(DecoderEvent::Error(format!("seek failed: {}", e)));
            }
        }
    }

    async fn next_event(&mut self) -> Option<DecoderEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.closed {
                return None;
            }
            let bus = self.pipeline.bus()?;
            let Some(msg) = bus.pop() else {
                tokio::time::sleep(BUS_POLL_INTERVAL).await;
                continue;
            };

            use gstreamer::MessageView;
            match msg.view() {
                MessageView::Error(err) => {
                    return Some(DecoderEvent::Error(err.error().to_string()));
                }
                MessageView::AsyncDone(_) if !self.metadata_loaded => {
                    self.metadata_loaded = true;
                    return Some(DecoderEvent::LoadedMetadata);
                }
                MessageView::AsyncDone(_) if self.seeking => {
                    self.seeking = false;
                    self.pending.push_back(DecoderEvent::Seeked);
                    return Some(DecoderEvent::TimeUpdate);
                }
                _ => {}
            }
        }
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if self.closed {
            return None;
        }
        self.preroll_frame()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.pending.clear();
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(?e, "Failed to stop pipeline");
        }
    }
}

impl Drop for GstSession {
    fn drop(&mut self) {
        self.close();
    }
}
