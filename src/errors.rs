// SPDX-License-Identifier: GPL-3.0-only

//! Error types for capture, extraction and drafting

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Recording-related errors
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),
    /// Photo capture errors
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Gallery selection rejected
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// Duration probe or frame extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),
    /// Post draft errors
    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// No camera devices found
    #[error("No camera devices found")]
    NoCameraFound,
    /// Stream acquisition failed (permission denied, device busy, ...)
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    /// Operation not allowed in the current capture state
    #[error("Invalid capture state: {0}")]
    InvalidState(&'static str),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    /// Failed to start recording
    #[error("Failed to start recording: {0}")]
    StartFailed(String),
    /// Recording already in progress
    #[error("Recording already in progress")]
    AlreadyRecording,
    /// No recording to stop
    #[error("No recording in progress")]
    NotRecording,
    /// Recorder stopped without delivering any data
    #[error("Recording produced no data")]
    Empty,
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    /// No frame available for capture
    #[error("No frame available for capture")]
    NoFrameAvailable,
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Gallery selection rejected before any draft was created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: ValidationReason,
}

/// Why a selection was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("no files selected")]
    Empty,
    #[error("too many files: {count} selected, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },
    #[error("'{name}' has type '{mime}', expected {expected}/*")]
    WrongType {
        name: String,
        mime: String,
        expected: &'static str,
    },
    #[error("'{name}' is {size} bytes, limit is {limit} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },
}

impl From<ValidationReason> for ValidationError {
    fn from(reason: ValidationReason) -> Self {
        Self { reason }
    }
}

/// Duration probe and frame extraction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// Decoder could not open the source
    #[error("Failed to open source: {0}")]
    Open(String),
    /// The decoder reported an error
    #[error("Decoder error: {0}")]
    Decoder(String),
    /// A completion event did not arrive in time
    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, &'static str),
    /// The decoder ended before delivering the expected event
    #[error("Decoder closed while waiting for {0}")]
    Closed(&'static str),
    /// No decoded frame available after the seek completed
    #[error("No decoded frame at {0:.3}s")]
    NoFrame(f64),
    /// Duration could not be determined
    #[error("Video duration unavailable")]
    DurationUnavailable,
    /// JPEG encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Post draft errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// A cover was offered but the draft holds no video
    #[error("Cover thumbnail requires a video")]
    CoverWithoutVideo,
    /// Image index out of range
    #[error("Image index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// Submission requested while the draft is not ready
    #[error("Draft is not ready to submit")]
    NotReady,
    /// Submission collaborator failed
    #[error("Submission failed: {0}")]
    Submission(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for ExtractError {
    fn from(err: image::ImageError) -> Self {
        ExtractError::Encoding(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}
