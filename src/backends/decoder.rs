// SPDX-License-Identifier: GPL-3.0-only

//! Seekable video decoder seam
//!
//! A decoder session behaves like a media element: commands return
//! immediately and their completion arrives later as a [`DecoderEvent`].
//! Sessions are driven through `&mut self`, so at most one seek is in
//! flight per session.

use crate::errors::ExtractError;
use crate::media::{MediaBlob, VideoFrame};

/// Completion events reported by a decoder session
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    /// Container metadata (duration, natural size) is available
    LoadedMetadata,
    /// Playback position changed
    TimeUpdate,
    /// A seek finished and the frame at the new position is decodable
    Seeked,
    /// The decoder failed
    Error(String),
}

/// Opens decoder sessions over media bytes
pub trait VideoDecoder {
    type Session: DecoderSession;

    fn open(&self, blob: &MediaBlob) -> Result<Self::Session, ExtractError>;
}

/// One open decoding pipeline
#[allow(async_fn_in_trait)]
pub trait DecoderSession {
    /// Duration as currently reported by the container
    ///
    /// May be `f64::INFINITY` or NaN until the decoder has seen the end of
    /// the stream.
    fn duration(&self) -> f64;

    /// Natural frame size in pixels
    fn natural_size(&self) -> (u32, u32);

    /// Request a seek; completion is signalled by `TimeUpdate` and `Seeked`
    fn seek(&mut self, position_secs: f64);

    /// Wait for the next event, `None` once the session has ended
    async fn next_event(&mut self) -> Option<DecoderEvent>;

    /// Frame at the current position, if one has been decoded
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Release the pipeline; further events are not delivered
    fn close(&mut self);
}
