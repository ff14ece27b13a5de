// SPDX-License-Identifier: GPL-3.0-only

//! Capture and thumbnail pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │   Shutter    │ ──▶ │ GestureRecognizer │ ──▶ │   Capture    │ ──▶ photo / clip
//! │ press/release│     │  Click/LongPress  │     │  Controller  │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Video blob  │ ──▶ │  FrameExtractor   │ ──▶ │   Scrubber   │ ──▶ cover
//! │              │     │ probe / seek/draw │     │ strip + drag │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! All completions (timers, recorder chunks, decoder seeks) arrive as async
//! events; components are driven through `&mut self`.
//!
//! # Modules
//!
//! - [`gesture`]: tap vs. press-and-hold on one shutter button
//! - [`capture`]: preview / photo / recording / review state machine
//! - [`extract`]: duration probe and frame-at-timestamp extraction
//! - [`scrubber`]: thumbnail strip and drag-to-scrub cover selection

pub mod capture;
pub mod extract;
pub mod gesture;
pub mod scrubber;

pub use capture::{CaptureController, CaptureState, CaptureUpdate, CapturedMedia};
pub use extract::{ExtractorSession, FrameExtractor};
pub use gesture::{Gesture, GestureRecognizer};
pub use scrubber::{DragBounds, StripGeometry, ThumbnailScrubber, strip_count, strip_timestamps};
