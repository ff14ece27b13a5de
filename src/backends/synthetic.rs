// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera, recorder and decoder
//!
//! Deterministic in-process backends used by the `simulate` command and the
//! test suite. Video is carried in a tiny container (`.synv`):
//!
//! ```text
//! "SYNV" | width: u32 LE | height: u32 LE | one seed byte per second
//! ```
//!
//! Each second of content is a solid frame whose color is derived from its
//! seed byte. The format concatenates cleanly, so recorder chunks joined in
//! order form a valid clip.

use super::camera::{CameraDevice, MediaRecorder, RecorderEvent, RecorderSender};
use super::decoder::{DecoderEvent, DecoderSession, VideoDecoder};
use crate::constants::FacingMode;
use crate::errors::{CameraError, ExtractError, PhotoError, RecordingError};
use crate::media::{MediaBlob, VideoFrame};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// MIME type of synthetic clips read from disk
pub const SYNTHETIC_MIME: &str = "video/x-postcam-synthetic";

const MAGIC: &[u8; 4] = b"SYNV";
const HEADER_LEN: usize = 12;

/// Interval between recorder chunks
const CHUNK_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// Clip format
// =============================================================================

/// A parsed synthetic clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticClip {
    pub width: u32,
    pub height: u32,
    /// One seed per second of content
    pub seeds: Vec<u8>,
}

impl SyntheticClip {
    /// A clip of `secs` seconds with seeds `0, 1, 2, ...`
    pub fn new(width: u32, height: u32, secs: usize) -> Self {
        Self {
            width,
            height,
            seeds: (0..secs).map(|i| i as u8).collect(),
        }
    }

    /// Container header for a clip of the given size
    pub fn header(width: u32, height: u32) -> Vec<u8> {
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&width.to_le_bytes());
        header.extend_from_slice(&height.to_le_bytes());
        header
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Self::header(self.width, self.height);
        bytes.extend_from_slice(&self.seeds);
        bytes
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ExtractError> {
        if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
            return Err(ExtractError::Open("not a synthetic clip".into()));
        }
        let width = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let height = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        if width == 0 || height == 0 {
            return Err(ExtractError::Open(format!("invalid frame size {width}x{height}")));
        }
        Ok(Self {
            width,
            height,
            seeds: bytes[HEADER_LEN..].to_vec(),
        })
    }

    /// Content length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.seeds.len() as f64
    }

    /// Solid frame shown at `position_secs` (last frame past the end)
    pub fn frame_at(&self, position_secs: f64) -> Option<VideoFrame> {
        let last = self.seeds.len().checked_sub(1)?;
        let index = (position_secs.max(0.0).floor() as usize).min(last);
        Some(VideoFrame::solid(
            self.width,
            self.height,
            frame_color(self.seeds[index]),
        ))
    }
}

/// Color of the frame generated from a seed byte
pub fn frame_color(seed: u8) -> [u8; 4] {
    [
        seed.wrapping_mul(37),
        seed.wrapping_mul(91).wrapping_add(40),
        255 - seed,
        255,
    ]
}

// =============================================================================
// Camera
// =============================================================================

fn camera_frame(width: u32, height: u32, seed: u8) -> VideoFrame {
    let color = frame_color(seed);
    let black = [0, 0, 0, 255];
    let half = width / 2;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..height {
        for x in 0..width {
            data.extend_from_slice(if x < half { &color } else { &black });
        }
    }
    VideoFrame::from_rgba(width, height, data)
}

/// In-process camera
///
/// Stills carry the seed color on their left half and black on the right,
/// so a mirrored capture can be told apart.
#[derive(Debug)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    camera_count: usize,
    facing: Option<FacingMode>,
    fail_acquire: bool,
    fail_recorder: bool,
    frames_grabbed: u8,
    acquisitions: usize,
    overlapping_acquisitions: usize,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            camera_count: 2,
            facing: None,
            fail_acquire: false,
            fail_recorder: false,
            frames_grabbed: 0,
            acquisitions: 0,
            overlapping_acquisitions: 0,
        }
    }

    pub fn with_camera_count(mut self, count: usize) -> Self {
        self.camera_count = count;
        self
    }

    /// Every acquisition fails, as if permission were denied
    pub fn denied(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    /// Recorder creation fails
    pub fn without_recorder(mut self) -> Self {
        self.fail_recorder = true;
        self
    }

    /// Facing mode of the live stream
    pub fn facing(&self) -> Option<FacingMode> {
        self.facing
    }

    /// Number of successful stream acquisitions so far
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    /// Acquisitions requested while a stream was still live
    pub fn overlapping_acquisitions(&self) -> usize {
        self.overlapping_acquisitions
    }
}

impl CameraDevice for SyntheticCamera {
    fn camera_count(&self) -> usize {
        self.camera_count
    }

    fn acquire(&mut self, facing: FacingMode) -> Result<(), CameraError> {
        if self.fail_acquire {
            return Err(CameraError::Unavailable("permission denied".into()));
        }
        if self.camera_count == 0 {
            return Err(CameraError::NoCameraFound);
        }
        if self.facing.is_some() {
            warn!("Acquiring over a live stream, stopping the old one first");
            self.overlapping_acquisitions += 1;
            self.stop();
        }
        self.facing = Some(facing);
        self.acquisitions += 1;
        debug!(facing = facing.display_name(), "Synthetic stream acquired");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(facing) = self.facing.take() {
            debug!(facing = facing.display_name(), "Synthetic stream stopped");
        }
    }

    fn is_streaming(&self) -> bool {
        self.facing.is_some()
    }

    fn grab_frame(&mut self) -> Result<VideoFrame, PhotoError> {
        if self.facing.is_none() {
            return Err(PhotoError::NoFrameAvailable);
        }
        let seed = self.frames_grabbed;
        self.frames_grabbed = self.frames_grabbed.wrapping_add(1);
        Ok(camera_frame(self.width, self.height, seed))
    }

    fn create_recorder(&mut self) -> Result<Box<dyn MediaRecorder>, RecordingError> {
        if self.fail_recorder {
            return Err(RecordingError::StartFailed("recorder not supported".into()));
        }
        if self.facing.is_none() {
            return Err(RecordingError::StartFailed("no live stream".into()));
        }
        Ok(Box::new(SyntheticRecorder::new(self.width, self.height)))
    }
}

// =============================================================================
// Recorder
// =============================================================================

/// Recorder emitting one chunk per second of content
#[derive(Debug)]
pub struct SyntheticRecorder {
    width: u32,
    height: u32,
    active: Arc<AtomicBool>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SyntheticRecorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            active: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
        }
    }
}

impl MediaRecorder for SyntheticRecorder {
    fn start(&mut self, mime: &str, events: RecorderSender) -> Result<(), RecordingError> {
        if self.active.load(Ordering::SeqCst) {
            return Err(RecordingError::AlreadyRecording);
        }
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        self.active.store(true, Ordering::SeqCst);

        let header = SyntheticClip::header(self.width, self.height);
        let active = Arc::clone(&self.active);
        info!(mime, "Synthetic recorder started");

        tokio::spawn(async move {
            if events.send(RecorderEvent::DataAvailable(header)).is_err() {
                active.store(false, Ordering::SeqCst);
                return;
            }
            let start = tokio::time::Instant::now() + CHUNK_INTERVAL;
            let mut interval = tokio::time::interval_at(start, CHUNK_INTERVAL);
            let mut second: u8 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => {
                        // Flush: nothing buffered between ticks
                        let _ = events.send(RecorderEvent::DataAvailable(Vec::new()));
                        let _ = events.send(RecorderEvent::Stopped);
                        break;
                    }
                    _ = interval.tick() => {
                        if events.send(RecorderEvent::DataAvailable(vec![second])).is_err() {
                            break;
                        }
                        second = second.wrapping_add(1);
                    }
                }
            }
            active.store(false, Ordering::SeqCst);
            debug!(seconds = second, "Synthetic recorder finished");
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && self.stop_tx.is_some()
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// How a synthetic decoder reports duration and completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderBehavior {
    /// Finite duration from the start
    #[default]
    Normal,
    /// Reports infinity until a seek past the end
    Indeterminate,
    /// Reports NaN until a seek past the end
    NotANumber,
    /// Reports infinity forever
    Unresolvable,
    /// Never emits any event
    Stalled,
    /// Emits a decoder error instead of metadata
    Broken,
    /// Reports metadata only after a delay and drops seeks issued before it
    LateMetadata,
    /// Reports metadata but never completes a seek
    Unseekable,
}

/// Delay before a [`DecoderBehavior::LateMetadata`] session is ready
pub const LATE_METADATA_DELAY: Duration = Duration::from_millis(250);

/// Decoder for `.synv` clips
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticDecoder {
    behavior: DecoderBehavior,
}

impl SyntheticDecoder {
    pub fn new(behavior: DecoderBehavior) -> Self {
        Self { behavior }
    }
}

impl VideoDecoder for SyntheticDecoder {
    type Session = SyntheticSession;

    fn open(&self, blob: &MediaBlob) -> Result<SyntheticSession, ExtractError> {
        let clip = SyntheticClip::parse(blob.bytes())?;
        let mut pending = VecDeque::new();
        let mut metadata_at = None;
        match self.behavior {
            DecoderBehavior::Stalled => {}
            DecoderBehavior::LateMetadata => {
                metadata_at = Some(tokio::time::Instant::now() + LATE_METADATA_DELAY)
            }
            DecoderBehavior::Broken => {
                pending.push_back(DecoderEvent::Error("corrupt stream".into()))
            }
            _ => pending.push_back(DecoderEvent::LoadedMetadata),
        }
        debug!(
            name = blob.name(),
            width = clip.width,
            height = clip.height,
            secs = clip.seeds.len(),
            behavior = ?self.behavior,
            "Synthetic session opened"
        );
        Ok(SyntheticSession {
            clip,
            behavior: self.behavior,
            materialized: false,
            position: 0.0,
            pending,
            metadata_at,
            closed: false,
        })
    }
}

/// One open synthetic decoding session
#[derive(Debug)]
pub struct SyntheticSession {
    clip: SyntheticClip,
    behavior: DecoderBehavior,
    materialized: bool,
    position: f64,
    pending: VecDeque<DecoderEvent>,
    metadata_at: Option<tokio::time::Instant>,
    closed: bool,
}

impl SyntheticSession {
    /// Current playback position
    pub fn position(&self) -> f64 {
        self.position
    }
}

impl DecoderSession for SyntheticSession {
    fn duration(&self) -> f64 {
        match self.behavior {
            DecoderBehavior::Normal
            | DecoderBehavior::Broken
            | DecoderBehavior::LateMetadata
            | DecoderBehavior::Unseekable => self.clip.duration_secs(),
            DecoderBehavior::Indeterminate if self.materialized => self.clip.duration_secs(),
            DecoderBehavior::NotANumber if self.materialized => self.clip.duration_secs(),
            DecoderBehavior::NotANumber => f64::NAN,
            _ => f64::INFINITY,
        }
    }

    fn natural_size(&self) -> (u32, u32) {
        (self.clip.width, self.clip.height)
    }

    fn seek(&mut self, position_secs: f64) {
        if self.closed || self.behavior == DecoderBehavior::Stalled {
            return;
        }
        if self.metadata_at.is_some() {
            debug!(position_secs, "Seek before metadata dropped");
            return;
        }
        let end = self.clip.duration_secs();
        if position_secs >= end {
            self.materialized = true;
        }
        self.position = if position_secs.is_nan() {
            0.0
        } else {
            position_secs.clamp(0.0, end)
        };
        if self.behavior == DecoderBehavior::Unseekable {
            return;
        }
        self.pending.push_back(DecoderEvent::TimeUpdate);
        self.pending.push_back(DecoderEvent::Seeked);
    }

    async fn next_event(&mut self) -> Option<DecoderEvent> {
        if self.closed {
            return None;
        }
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        match self.metadata_at {
            Some(ready_at) => {
                tokio::time::sleep_until(ready_at).await;
                self.metadata_at = None;
                Some(DecoderEvent::LoadedMetadata)
            }
            None => std::future::pending().await,
        }
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if self.closed {
            return None;
        }
        self.clip.frame_at(self.position)
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn clip_blob(secs: usize) -> MediaBlob {
        MediaBlob::new(SyntheticClip::new(8, 6, secs).encode(), SYNTHETIC_MIME, "clip.synv")
    }

    #[test]
    fn test_clip_parse_rejects_garbage() {
        assert!(SyntheticClip::parse(b"nope").is_err());
        let clip = SyntheticClip::new(4, 4, 3);
        assert_eq!(SyntheticClip::parse(&clip.encode()).unwrap(), clip);
    }

    #[test]
    fn test_frame_past_end_is_last_frame() {
        let clip = SyntheticClip::new(2, 2, 3);
        let last = clip.frame_at(1e101).unwrap();
        assert_eq!(&last.data[..4], &frame_color(2));
        assert!(SyntheticClip::new(2, 2, 0).frame_at(0.0).is_none());
    }

    #[tokio::test]
    async fn test_indeterminate_duration_materializes_after_past_end_seek() {
        let decoder = SyntheticDecoder::new(DecoderBehavior::Indeterminate);
        let mut session = decoder.open(&clip_blob(7)).unwrap();
        assert_eq!(session.next_event().await, Some(DecoderEvent::LoadedMetadata));
        assert!(session.duration().is_infinite());

        session.seek(1e101);
        assert_eq!(session.next_event().await, Some(DecoderEvent::TimeUpdate));
        assert_eq!(session.duration(), 7.0);
        assert_eq!(session.position(), 7.0);
    }

    #[tokio::test]
    async fn test_closed_session_ends_event_stream() {
        let mut session = SyntheticDecoder::default().open(&clip_blob(2)).unwrap();
        session.close();
        assert_eq!(session.next_event().await, None);
        assert!(session.current_frame().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorder_chunks_form_a_clip() {
        let mut camera = SyntheticCamera::new(4, 2);
        camera.acquire(FacingMode::User).unwrap();
        let mut recorder = camera.create_recorder().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        recorder.start("video/mp4", tx).unwrap();
        assert!(recorder.is_active());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        recorder.stop();
        assert!(!recorder.is_active());

        let mut bytes = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                RecorderEvent::DataAvailable(chunk) => bytes.extend(chunk),
                RecorderEvent::Stopped => break,
            }
        }
        let clip = SyntheticClip::parse(&bytes).unwrap();
        assert_eq!((clip.width, clip.height), (4, 2));
        assert_eq!(clip.seeds, vec![0, 1, 2]);
    }

    #[test]
    fn test_denied_camera_reports_unavailable() {
        let mut camera = SyntheticCamera::default().denied();
        assert!(matches!(
            camera.acquire(FacingMode::Environment),
            Err(CameraError::Unavailable(_))
        ));
        assert!(!camera.is_streaming());
        assert!(camera.create_recorder().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_metadata_drops_early_seeks() {
        let decoder = SyntheticDecoder::new(DecoderBehavior::LateMetadata);
        let mut session = decoder.open(&clip_blob(3)).unwrap();
        session.seek(1.0);
        assert_eq!(session.position(), 0.0);

        let start = tokio::time::Instant::now();
        assert_eq!(session.next_event().await, Some(DecoderEvent::LoadedMetadata));
        assert!(start.elapsed() >= LATE_METADATA_DELAY);

        session.seek(1.0);
        assert_eq!(session.next_event().await, Some(DecoderEvent::TimeUpdate));
        assert_eq!(session.next_event().await, Some(DecoderEvent::Seeked));
        assert_eq!(session.position(), 1.0);
    }
}
