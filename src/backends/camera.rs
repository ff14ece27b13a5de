// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream and recorder command traits
//!
//! Commands return synchronously. Recorder output (chunks and the final
//! stop signal) is delivered asynchronously on the channel handed to
//! [`MediaRecorder::start`].

use crate::constants::FacingMode;
use crate::errors::{CameraError, PhotoError, RecordingError};
use crate::media::VideoFrame;
use tokio::sync::mpsc;

/// Output of an active recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// A chunk of encoded media (may be empty)
    DataAvailable(Vec<u8>),
    /// The recorder has flushed its last chunk and stopped
    Stopped,
}

/// Sender half handed to a recorder
pub type RecorderSender = mpsc::UnboundedSender<RecorderEvent>;

/// A camera that can stream, take stills and record
pub trait CameraDevice: Send {
    // ===== Enumeration =====

    /// Number of cameras available on this device
    fn camera_count(&self) -> usize;

    // ===== Lifecycle =====

    /// Acquire an audio-less stream from the camera facing `facing`
    ///
    /// # Returns
    /// * `Ok(())` - Stream is live
    /// * `Err(CameraError::Unavailable)` - Permission denied or device busy
    fn acquire(&mut self, facing: FacingMode) -> Result<(), CameraError>;

    /// Stop every track of the current stream
    fn stop(&mut self);

    /// Check if a stream is currently live
    fn is_streaming(&self) -> bool;

    // ===== Capture =====

    /// Grab the current preview frame at native resolution
    fn grab_frame(&mut self) -> Result<VideoFrame, PhotoError>;

    /// Create a recorder attached to the live stream
    ///
    /// # Returns
    /// * `Err(RecordingError::StartFailed)` - No live stream or unsupported
    fn create_recorder(&mut self) -> Result<Box<dyn MediaRecorder>, RecordingError>;
}

/// An imperative media recorder
pub trait MediaRecorder: Send {
    /// Start recording with the given MIME type
    ///
    /// Chunks are sent as [`RecorderEvent::DataAvailable`]; after
    /// [`stop`](Self::stop) any remaining data is flushed, followed by
    /// exactly one [`RecorderEvent::Stopped`].
    fn start(&mut self, mime: &str, events: RecorderSender) -> Result<(), RecordingError>;

    /// Request the recorder to stop
    fn stop(&mut self);

    /// Check if the recorder is still producing data
    fn is_active(&self) -> bool;
}
