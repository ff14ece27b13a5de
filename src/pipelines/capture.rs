// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! ```text
//!              Click                    accept
//!   ┌──────────────────────▶ ReviewPhoto ──────────▶ Closed
//!   │                            │ reject              ▲
//! LivePreview ◀──────────────────┤                     │ accept
//!   │                            │ reject              │
//!   │  LongPress              ReviewVideo ─────────────┘
//!   └──────────▶ Recording ──────▶ ▲
//!                  │ release / max duration (recorder Stopped)
//! ```
//!
//! Camera acquisition failure moves the session to `Unavailable`, which is
//! terminal. Review states hold neither the camera stream nor a recorder.

use super::gesture::Gesture;
use crate::backends::{CameraDevice, MediaRecorder, RecorderEvent};
use crate::config::Config;
use crate::constants::{FacingMode, recording};
use crate::errors::{AppError, CameraError, PhotoError, RecordingError};
use crate::media::{MediaBlob, MediaDraft, MediaKind, Previews, surface};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Media handed to the caller on accept
#[derive(Debug)]
pub enum CapturedMedia {
    Photo(MediaDraft),
    Video(MediaDraft),
}

impl CapturedMedia {
    pub fn draft(&self) -> &MediaDraft {
        match self {
            CapturedMedia::Photo(draft) | CapturedMedia::Video(draft) => draft,
        }
    }

    pub fn into_draft(self) -> MediaDraft {
        match self {
            CapturedMedia::Photo(draft) | CapturedMedia::Video(draft) => draft,
        }
    }
}

/// Observable capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    LivePreview,
    Recording { progress_secs: u32, stopping: bool },
    ReviewPhoto,
    ReviewVideo,
    Unavailable,
    Closed,
}

impl CaptureState {
    pub fn is_review(&self) -> bool {
        matches!(self, CaptureState::ReviewPhoto | CaptureState::ReviewVideo)
    }
}

/// Something the caller may want to render after an event was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureUpdate {
    /// One second of recording elapsed
    Progress(u32),
    /// The maximum duration was reached and the recorder was asked to stop
    AutoStopped(u32),
    /// Recording finalized, now reviewing the clip
    Finished { bytes: usize },
    /// Recording ended without usable data, back to live preview
    Failed(RecordingError),
}

/// Per-second progress ticker
///
/// Ticks carry the generation they were started with; dropping the ticker
/// aborts its task.
struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(generation: u64, period: Duration, ticks: mpsc::UnboundedSender<u64>) -> Self {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if ticks.send(generation).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An active recording
struct RecordingSession {
    recorder: Box<dyn MediaRecorder>,
    events: mpsc::UnboundedReceiver<RecorderEvent>,
    chunks: Vec<Vec<u8>>,
    progress_secs: u32,
    stopping: bool,
    ticker: Option<Ticker>,
}

enum Phase {
    LivePreview,
    Recording(RecordingSession),
    ReviewPhoto(MediaDraft),
    ReviewVideo(MediaDraft),
    Unavailable(CameraError),
    Closed,
}

/// What woke up the recording loop
enum RecordingInput {
    Tick(u64),
    Recorder(Option<RecorderEvent>),
}

/// Drives the camera through preview, capture and review
pub struct CaptureController<C: CameraDevice> {
    camera: C,
    previews: Previews,
    facing: FacingMode,
    max_duration_secs: u32,
    tick_interval: Duration,
    photo_quality: u8,
    mirror_photos: bool,
    phase: Phase,
    generation: u64,
    tick_tx: mpsc::UnboundedSender<u64>,
    tick_rx: mpsc::UnboundedReceiver<u64>,
}

impl<C: CameraDevice> CaptureController<C> {
    /// Enter capture mode: acquire the default camera
    ///
    /// Acquisition failure leaves the controller in `Unavailable`.
    pub fn open(camera: C, config: &Config, previews: Previews) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            camera,
            previews,
            facing: config.default_facing,
            max_duration_secs: config.max_recording_secs.max(1),
            tick_interval: recording::TICK_INTERVAL,
            photo_quality: config.cover_quality,
            mirror_photos: config.mirror_preview,
            phase: Phase::LivePreview,
            generation: 0,
            tick_tx,
            tick_rx,
        };
        if let Err(e) = controller.acquire() {
            warn!(error = %e, "Capture opened without a camera");
        }
        controller
    }

    // ===== Queries =====

    pub fn state(&self) -> CaptureState {
        match &self.phase {
            Phase::LivePreview => CaptureState::LivePreview,
            Phase::Recording(session) => CaptureState::Recording {
                progress_secs: session.progress_secs,
                stopping: session.stopping,
            },
            Phase::ReviewPhoto(_) => CaptureState::ReviewPhoto,
            Phase::ReviewVideo(_) => CaptureState::ReviewVideo,
            Phase::Unavailable(_) => CaptureState::Unavailable,
            Phase::Closed => CaptureState::Closed,
        }
    }

    /// Why the camera is unavailable, if it is
    pub fn unavailable_reason(&self) -> Option<&CameraError> {
        match &self.phase {
            Phase::Unavailable(e) => Some(e),
            _ => None,
        }
    }

    /// Draft held for review
    pub fn review(&self) -> Option<&MediaDraft> {
        match &self.phase {
            Phase::ReviewPhoto(draft) | Phase::ReviewVideo(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn camera_count(&self) -> usize {
        self.camera.camera_count()
    }

    pub fn max_duration_secs(&self) -> u32 {
        self.max_duration_secs
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording(_))
    }

    /// Whether a recorder is attached and producing data
    pub fn recorder_active(&self) -> bool {
        match &self.phase {
            Phase::Recording(session) => session.recorder.is_active(),
            _ => false,
        }
    }

    // ===== Gestures =====

    /// Apply a gesture from the shutter button
    pub fn handle_gesture(&mut self, gesture: Gesture) -> Result<(), AppError> {
        let live = matches!(self.phase, Phase::LivePreview);
        match (gesture, live) {
            (Gesture::Click, true) => Ok(self.take_photo()?),
            (Gesture::LongPress, true) => Ok(self.start_recording()?),
            (gesture, false) => {
                debug!(?gesture, state = ?self.state(), "Gesture ignored");
                Ok(())
            }
        }
    }

    /// Shutter released after a long press
    pub fn release(&mut self) {
        if !matches!(&self.phase, Phase::Recording(session) if !session.stopping) {
            return;
        }
        if let Err(e) = self.stop_recording() {
            warn!(error = %e, "Failed to stop recording on release");
        }
    }

    // ===== Photo =====

    /// Grab a still, hold it for review and stop the stream
    ///
    /// Front-camera stills are mirrored to match the preview when
    /// `mirror_preview` is set.
    pub fn take_photo(&mut self) -> Result<(), PhotoError> {
        if !matches!(self.phase, Phase::LivePreview) {
            return Err(PhotoError::NoFrameAvailable);
        }
        let frame = self.camera.grab_frame()?;
        let mut image = frame.to_image().ok_or(PhotoError::NoFrameAvailable)?;
        if self.mirror_photos && self.facing == FacingMode::User {
            image::imageops::flip_horizontal_in_place(&mut image);
        }
        let jpeg = surface::encode_jpeg(&image, self.photo_quality)
            .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;

        let name = format!("image_{}.jpeg", chrono::Utc::now().timestamp_millis());
        info!(name = %name, width = frame.width, height = frame.height, "Photo captured");
        let blob = MediaBlob::new(jpeg, "image/jpeg", name);
        let draft = MediaDraft::new(MediaKind::Image, blob, &self.previews);

        self.camera.stop();
        self.phase = Phase::ReviewPhoto(draft);
        Ok(())
    }

    // ===== Video =====

    /// Start recording against the live stream
    ///
    /// A start failure leaves the session in live preview.
    pub fn start_recording(&mut self) -> Result<(), RecordingError> {
        match self.phase {
            Phase::LivePreview => {}
            Phase::Recording(_) => return Err(RecordingError::AlreadyRecording),
            _ => return Err(RecordingError::StartFailed("camera is not live".into())),
        }

        let mut recorder = self.camera.create_recorder()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        recorder.start(recording::MIME_TYPE, events_tx)?;

        self.generation += 1;
        let ticker = Ticker::spawn(self.generation, self.tick_interval, self.tick_tx.clone());
        self.phase = Phase::Recording(RecordingSession {
            recorder,
            events: events_rx,
            chunks: Vec::new(),
            progress_secs: 0,
            stopping: false,
            ticker: Some(ticker),
        });
        info!(
            generation = self.generation,
            max_secs = self.max_duration_secs,
            "Recording started"
        );
        Ok(())
    }

    /// Ask the recorder to stop; the clip is finalized by [`next_update`](Self::next_update)
    pub fn stop_recording(&mut self) -> Result<(), RecordingError> {
        let Phase::Recording(session) = &mut self.phase else {
            return Err(RecordingError::NotRecording);
        };
        if session.stopping {
            return Ok(());
        }
        session.stopping = true;
        session.ticker = None;
        session.recorder.stop();
        info!(progress_secs = session.progress_secs, "Stopping recording");
        Ok(())
    }

    /// Wait for the next recording event and apply it
    ///
    /// Returns `None` immediately when not recording.
    pub async fn next_update(&mut self) -> Option<CaptureUpdate> {
        loop {
            let input = {
                let Phase::Recording(session) = &mut self.phase else {
                    return None;
                };
                if session.stopping {
                    RecordingInput::Recorder(session.events.recv().await)
                } else {
                    tokio::select! {
                        Some(generation) = self.tick_rx.recv() => RecordingInput::Tick(generation),
                        event = session.events.recv() => RecordingInput::Recorder(event),
                    }
                }
            };

            match input {
                RecordingInput::Tick(generation) => {
                    if let Some(update) = self.apply_tick(generation) {
                        return Some(update);
                    }
                }
                RecordingInput::Recorder(Some(RecorderEvent::DataAvailable(chunk))) => {
                    if let Phase::Recording(session) = &mut self.phase {
                        if !chunk.is_empty() {
                            session.chunks.push(chunk);
                        }
                    }
                }
                RecordingInput::Recorder(Some(RecorderEvent::Stopped) | None) => {
                    return Some(self.finish_recording());
                }
            }
        }
    }

    fn apply_tick(&mut self, generation: u64) -> Option<CaptureUpdate> {
        let max = self.max_duration_secs;
        let Phase::Recording(session) = &mut self.phase else {
            return None;
        };
        if generation != self.generation || session.stopping {
            debug!(generation, current = self.generation, "Stale tick ignored");
            return None;
        }

        session.progress_secs = (session.progress_secs + 1).min(max);
        let progress = session.progress_secs;
        if progress < max {
            return Some(CaptureUpdate::Progress(progress));
        }

        info!(progress_secs = progress, "Maximum duration reached");
        if let Err(e) = self.stop_recording() {
            warn!(error = %e, "Auto-stop failed");
        }
        Some(CaptureUpdate::AutoStopped(progress))
    }

    /// Concatenate chunks into the clip and move to review
    fn finish_recording(&mut self) -> CaptureUpdate {
        let Phase::Recording(session) = std::mem::replace(&mut self.phase, Phase::LivePreview)
        else {
            return CaptureUpdate::Failed(RecordingError::NotRecording);
        };
        let RecordingSession {
            mut recorder,
            chunks,
            progress_secs,
            ..
        } = session;
        recorder.stop();
        drop(recorder);

        let bytes: Vec<u8> = chunks.concat();
        if bytes.is_empty() {
            error!("Recorder stopped without data");
            return CaptureUpdate::Failed(RecordingError::Empty);
        }

        let size = bytes.len();
        let blob = MediaBlob::new(bytes, recording::MIME_TYPE, recording::FILE_NAME);
        let draft = MediaDraft::new(MediaKind::Video, blob, &self.previews);
        self.camera.stop();
        self.phase = Phase::ReviewVideo(draft);
        info!(bytes = size, progress_secs, "Recording finished");
        CaptureUpdate::Finished { bytes: size }
    }

    // ===== Review =====

    /// Hand the reviewed media to the caller and close the session
    pub fn accept(&mut self) -> Result<CapturedMedia, CameraError> {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::ReviewPhoto(draft) => Ok(CapturedMedia::Photo(draft)),
            Phase::ReviewVideo(draft) => Ok(CapturedMedia::Video(draft)),
            other => {
                self.phase = other;
                Err(CameraError::InvalidState("nothing to accept"))
            }
        }
    }

    /// Discard the reviewed media and go back to live preview
    pub fn reject(&mut self) -> Result<(), CameraError> {
        match std::mem::replace(&mut self.phase, Phase::LivePreview) {
            Phase::ReviewPhoto(draft) | Phase::ReviewVideo(draft) => {
                debug!(name = draft.source().name(), "Discarding capture");
                drop(draft);
                self.acquire()
            }
            other => {
                self.phase = other;
                Err(CameraError::InvalidState("nothing to reject"))
            }
        }
    }

    // ===== Camera =====

    /// Switch between front and rear camera (live preview only)
    pub fn switch_camera(&mut self) -> Result<FacingMode, CameraError> {
        if !matches!(self.phase, Phase::LivePreview) {
            return Err(CameraError::InvalidState("switch requires live preview"));
        }
        if self.camera.camera_count() < 2 {
            debug!("Only one camera, switch ignored");
            return Ok(self.facing);
        }
        self.camera.stop();
        self.facing = self.facing.flipped();
        info!(facing = self.facing.display_name(), "Switching camera");
        self.acquire()?;
        Ok(self.facing)
    }

    /// Leave capture mode, releasing the stream and any recorder
    pub fn close(&mut self) {
        if let Phase::Recording(session) = &mut self.phase {
            session.recorder.stop();
        }
        self.camera.stop();
        self.phase = Phase::Closed;
    }

    fn acquire(&mut self) -> Result<(), CameraError> {
        match self.camera.acquire(self.facing) {
            Ok(()) => {
                self.phase = Phase::LivePreview;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, facing = self.facing.display_name(), "Camera unavailable");
                self.camera.stop();
                self.phase = Phase::Unavailable(e.clone());
                Err(e)
            }
        }
    }
}

impl<C: CameraDevice> Drop for CaptureController<C> {
    fn drop(&mut self) {
        self.close();
    }
}
