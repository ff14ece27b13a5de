// SPDX-License-Identifier: GPL-3.0-only

//! postcam - capture and cover selection for short-form posts
//!
//! This library turns a live camera (tap for a photo, hold to record a
//! time-boxed clip) or a gallery selection into a post draft, and derives a
//! cover image for video posts from frames extracted at arbitrary
//! timestamps.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera, recorder and video decoder abstraction
//! - [`media`]: Media values, preview handles, drawing surface, validation
//! - [`pipelines`]: Gesture, capture, extraction and scrubbing pipelines
//! - [`draft`]: The in-progress post and its submission
//! - [`config`]: User configuration handling
//! - [`install_prompt`]: Deferred install prompt slot
//!
//! # Example
//!
//! ```ignore
//! // Simulate a 3 second press-and-hold against the synthetic camera:
//! // postcam simulate --hold 3
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod draft;
pub mod errors;
pub mod install_prompt;
pub mod media;
pub mod pipelines;

// Re-export commonly used types
pub use config::Config;
pub use constants::{FacingMode, JpegQuality};
pub use draft::{PostDraft, SubmissionService, UploadKind, Visibility};
pub use errors::{AppError, AppResult};
pub use media::{Cover, MediaBlob, MediaDraft, MediaKind, VideoMeta};
pub use pipelines::{CaptureController, CaptureState, FrameExtractor, Gesture, GestureRecognizer};
