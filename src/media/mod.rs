// SPDX-License-Identifier: GPL-3.0-only

//! Media values shared by capture, extraction and drafting
//!
//! - [`MediaBlob`]: immutable byte source with a MIME type
//! - [`MediaDraft`]: a selected or captured item plus its preview handle
//! - [`ThumbnailCandidate`]: an extracted frame offered as a cover
//! - [`VideoMeta`]: set-once duration state of a video draft
//! - [`Cover`]: the chosen poster image, a video frame or a gallery image

pub mod preview;
pub mod surface;
pub mod validation;

pub use preview::{ObjectUrlStore, PreviewBackend, PreviewHandle, Previews};
pub use surface::{Surface, VideoFrame};
pub use validation::{SelectedFile, validate_images, validate_single_image, validate_video};

use std::fmt;
use std::sync::Arc;

/// Immutable media bytes with their MIME type
///
/// Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    bytes: Arc<[u8]>,
    mime: String,
    name: String,
}

impl MediaBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            name: name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MediaBlob({:?}, {}, {} bytes)",
            self.name,
            self.mime,
            self.bytes.len()
        )
    }
}

/// Kind of a media draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A selected or captured item and its preview handle
///
/// The draft exclusively owns its preview; dropping the draft releases it.
#[derive(Debug)]
pub struct MediaDraft {
    kind: MediaKind,
    source: MediaBlob,
    preview: PreviewHandle,
}

impl MediaDraft {
    /// Create a draft, registering a preview handle for its bytes
    pub fn new(kind: MediaKind, source: MediaBlob, previews: &Previews) -> Self {
        let preview = previews.create(&source);
        Self {
            kind,
            source,
            preview,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn source(&self) -> &MediaBlob {
        &self.source
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }
}

/// Duration state of a video draft
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VideoMeta {
    /// Probe has not completed
    #[default]
    Unprobed,
    /// Probe resolved a finite duration
    Probed { duration_secs: f64 },
    /// Probe timed out or never produced a finite value
    Unavailable,
}

impl VideoMeta {
    /// Build from a probed value, rejecting non-finite or negative values
    pub fn from_secs(duration_secs: f64) -> Self {
        if duration_secs.is_finite() && duration_secs >= 0.0 {
            VideoMeta::Probed { duration_secs }
        } else {
            VideoMeta::Unavailable
        }
    }

    /// Finite duration, if known
    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            VideoMeta::Probed { duration_secs } => Some(*duration_secs),
            _ => None,
        }
    }

    pub fn is_probed(&self) -> bool {
        !matches!(self, VideoMeta::Unprobed)
    }
}

/// An extracted frame offered as the post's cover
#[derive(Debug)]
pub struct ThumbnailCandidate {
    timestamp_secs: f64,
    image: MediaBlob,
    preview: PreviewHandle,
}

impl ThumbnailCandidate {
    pub fn new(timestamp_secs: f64, image: MediaBlob, previews: &Previews) -> Self {
        let preview = previews.create(&image);
        Self {
            timestamp_secs,
            image,
            preview,
        }
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_secs
    }

    pub fn image(&self) -> &MediaBlob {
        &self.image
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }
}

/// The poster image chosen for a video post
#[derive(Debug)]
pub enum Cover {
    /// A frame extracted from the video
    Frame(ThumbnailCandidate),
    /// An image picked from the gallery
    Gallery(MediaDraft),
}

impl Cover {
    pub fn image(&self) -> &MediaBlob {
        match self {
            Cover::Frame(candidate) => candidate.image(),
            Cover::Gallery(draft) => draft.source(),
        }
    }

    pub fn preview_url(&self) -> &str {
        match self {
            Cover::Frame(candidate) => candidate.preview_url(),
            Cover::Gallery(draft) => draft.preview_url(),
        }
    }

    /// Timestamp of the frame, `None` for gallery covers
    pub fn timestamp_secs(&self) -> Option<f64> {
        match self {
            Cover::Frame(candidate) => Some(candidate.timestamp_secs()),
            Cover::Gallery(_) => None,
        }
    }
}
