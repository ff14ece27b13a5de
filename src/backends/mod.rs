// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for cameras and video decoding
//!
//! The pipelines never talk to hardware or codecs directly. They drive
//! command traits and consume completion events:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Pipeline Layer                │
//! │      capture          extract / scrubber     │
//! └────────┬───────────────────────┬────────────┘
//!          │                       │
//! ┌────────┴────────┐    ┌─────────┴──────────┐
//! │  CameraDevice   │    │    VideoDecoder    │
//! │  MediaRecorder  │    │   DecoderSession   │
//! └────────┬────────┘    └─────────┬──────────┘
//!          │                       │
//! ┌────────┴───────────────────────┴────────────┐
//! │   synthetic (tests, CLI)   │  gst (feature) │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: camera stream and recorder command traits
//! - [`decoder`]: seekable decoder session trait and its events
//! - [`synthetic`]: deterministic in-process implementations
//! - `gst`: GStreamer decoder (feature `gstreamer`)

pub mod camera;
pub mod decoder;
#[cfg(feature = "gstreamer")]
pub mod gst;
pub mod synthetic;

pub use camera::{CameraDevice, MediaRecorder, RecorderEvent};
pub use decoder::{DecoderEvent, DecoderSession, VideoDecoder};
