// SPDX-License-Identifier: GPL-3.0-only

//! Gallery selection validation
//!
//! Runs before any draft is created. A selection is accepted or rejected as
//! a whole; the first offending file decides the error.

use super::MediaBlob;
use crate::config::SelectionLimits;
use crate::constants::{file_formats, selection};
use crate::errors::{ValidationError, ValidationReason};
use std::path::Path;
use tracing::{debug, warn};

/// A file picked from the gallery
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub blob: MediaBlob,
}

impl SelectedFile {
    pub fn new(blob: MediaBlob) -> Self {
        Self { blob }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = file_formats::mime_for_extension(&extension);
        Ok(Self::new(MediaBlob::new(bytes, mime, name)))
    }

    fn size(&self) -> u64 {
        self.blob.len() as u64
    }
}

fn check_file(
    file: &SelectedFile,
    expected: &'static str,
    limit: u64,
) -> Result<(), ValidationReason> {
    if !file.blob.mime().starts_with(expected) {
        return Err(ValidationReason::WrongType {
            name: file.blob.name().to_string(),
            mime: file.blob.mime().to_string(),
            expected,
        });
    }
    if file.size() > limit {
        return Err(ValidationReason::TooLarge {
            name: file.blob.name().to_string(),
            size: file.size(),
            limit,
        });
    }
    Ok(())
}

/// Validate a multi-image selection
///
/// Accepts up to `limits.max_images` files, each with an `image` MIME prefix
/// and at most `limits.image_size_limit` bytes.
pub fn validate_images(
    files: Vec<SelectedFile>,
    limits: &SelectionLimits,
) -> Result<Vec<MediaBlob>, ValidationError> {
    if files.is_empty() {
        return Err(ValidationReason::Empty.into());
    }
    if files.len() > limits.max_images {
        warn!(count = files.len(), max = limits.max_images, "Too many images selected");
        return Err(ValidationReason::TooManyFiles {
            count: files.len(),
            max: limits.max_images,
        }
        .into());
    }
    for file in &files {
        check_file(file, selection::IMAGE_MIME_PREFIX, limits.image_size_limit).map_err(|reason| {
            warn!(%reason, "Image rejected");
            ValidationError::from(reason)
        })?;
    }
    debug!(count = files.len(), "Image selection accepted");
    Ok(files.into_iter().map(|f| f.blob).collect())
}

/// Validate a single-image selection (used for picking a cover)
pub fn validate_single_image(
    files: Vec<SelectedFile>,
    limits: &SelectionLimits,
) -> Result<MediaBlob, ValidationError> {
    let single = SelectionLimits {
        max_images: 1,
        ..limits.clone()
    };
    let mut blobs = validate_images(files, &single)?;
    blobs.pop().ok_or_else(|| ValidationReason::Empty.into())
}

/// Validate a video selection (exactly one file)
pub fn validate_video(
    files: Vec<SelectedFile>,
    limits: &SelectionLimits,
) -> Result<MediaBlob, ValidationError> {
    let mut files = files.into_iter();
    let Some(file) = files.next() else {
        return Err(ValidationReason::Empty.into());
    };
    let extra = files.count();
    if extra > 0 {
        return Err(ValidationReason::TooManyFiles {
            count: extra + 1,
            max: 1,
        }
        .into());
    }
    check_file(&file, selection::VIDEO_MIME_PREFIX, limits.video_size_limit).map_err(|reason| {
        warn!(%reason, "Video rejected");
        ValidationError::from(reason)
    })?;
    debug!(name = file.blob.name(), size = file.size(), "Video selection accepted");
    Ok(file.blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> SelectedFile {
        SelectedFile::new(MediaBlob::new(vec![0u8; size], mime, name))
    }

    #[test]
    fn test_accepts_images_in_order() {
        let limits = SelectionLimits::default();
        let blobs = validate_images(
            vec![
                file("a.jpg", "image/jpeg", 10),
                file("b.png", "image/png", 20),
            ],
            &limits,
        )
        .unwrap();
        let names: Vec<_> = blobs.iter().map(|b| b.name()).collect();
        assert_eq!(names, ["a.jpg", "b.png"]);
    }

    #[test]
    fn test_rejects_eleven_images() {
        let limits = SelectionLimits::default();
        let files = (0..11).map(|i| file(&format!("{i}.jpg"), "image/jpeg", 1)).collect();
        let err = validate_images(files, &limits).unwrap_err();
        assert_eq!(
            err.reason,
            ValidationReason::TooManyFiles { count: 11, max: 10 }
        );
    }

    #[test]
    fn test_one_bad_file_rejects_whole_selection() {
        let limits = SelectionLimits {
            image_size_limit: 100,
            ..SelectionLimits::default()
        };
        let err = validate_images(
            vec![file("ok.jpg", "image/jpeg", 100), file("big.jpg", "image/jpeg", 101)],
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err.reason, ValidationReason::TooLarge { size: 101, .. }));

        let err = validate_images(vec![file("clip.mp4", "video/mp4", 1)], &limits).unwrap_err();
        assert!(matches!(err.reason, ValidationReason::WrongType { expected: "image", .. }));
    }

    #[test]
    fn test_video_must_be_single_and_video_typed() {
        let limits = SelectionLimits::default();
        assert!(validate_video(vec![file("v.mp4", "video/mp4", 10)], &limits).is_ok());
        assert_eq!(
            validate_video(vec![], &limits).unwrap_err().reason,
            ValidationReason::Empty
        );
        assert!(validate_video(
            vec![file("a.mp4", "video/mp4", 1), file("b.mp4", "video/mp4", 1)],
            &limits
        )
        .is_err());
        assert!(validate_video(vec![file("a.jpg", "image/jpeg", 1)], &limits).is_err());
    }

    #[test]
    fn test_single_image_rejects_two() {
        let limits = SelectionLimits::default();
        let err = validate_single_image(
            vec![file("a.jpg", "image/jpeg", 1), file("b.jpg", "image/jpeg", 1)],
            &limits,
        )
        .unwrap_err();
        assert_eq!(err.reason, ValidationReason::TooManyFiles { count: 2, max: 1 });
    }
}
