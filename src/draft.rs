// SPDX-License-Identifier: GPL-3.0-only

//! The in-progress post
//!
//! A draft holds either an ordered list of images or exactly one video
//! (never both), the chosen cover for a video, the caption and the
//! visibility. It owns every preview handle it holds; replacing or dropping
//! media releases them.

use crate::config::SelectionLimits;
use crate::errors::{DraftError, ValidationError};
use crate::media::{
    Cover, MediaBlob, MediaDraft, MediaKind, Previews, SelectedFile, VideoMeta, validate_images,
    validate_video,
};
use crate::pipelines::CapturedMedia;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Who can see the post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Upload path the submission takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Video,
    Images,
}

/// Progress reported by the submission collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmissionProgress {
    pub uploading: bool,
    /// 0..=100
    pub progress_percent: u8,
}

/// One image of the payload
#[derive(Debug, Clone)]
pub struct SubmissionImage {
    pub file: MediaBlob,
    pub url: String,
}

/// Payload handed to the submission collaborator
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub kind: UploadKind,
    pub images: Vec<SubmissionImage>,
    pub video: Option<MediaBlob>,
    pub cover: Option<MediaBlob>,
    pub caption: String,
    pub visibility: Visibility,
}

/// Sends a post to the backend
#[allow(async_fn_in_trait)]
pub trait SubmissionService {
    /// Submit the payload, reporting progress on `progress`
    async fn submit(
        &self,
        request: SubmissionRequest,
        progress: mpsc::UnboundedSender<SubmissionProgress>,
    ) -> Result<(), DraftError>;
}

/// The post being composed
#[derive(Debug)]
pub struct PostDraft {
    previews: Previews,
    limits: SelectionLimits,
    images: Vec<MediaDraft>,
    video: Option<MediaDraft>,
    video_meta: VideoMeta,
    cover: Option<Cover>,
    caption: String,
    visibility: Visibility,
    post_submitting: bool,
    progress: SubmissionProgress,
}

impl PostDraft {
    pub fn new(previews: Previews, limits: SelectionLimits) -> Self {
        Self {
            previews,
            limits,
            images: Vec::new(),
            video: None,
            video_meta: VideoMeta::Unprobed,
            cover: None,
            caption: String::new(),
            visibility: Visibility::default(),
            post_submitting: false,
            progress: SubmissionProgress::default(),
        }
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// Replace the media with a validated gallery image selection
    ///
    /// On rejection the draft is left untouched.
    pub fn select_images(&mut self, files: Vec<SelectedFile>) -> Result<(), ValidationError> {
        let blobs = validate_images(files, &self.limits)?;
        let images = blobs
            .into_iter()
            .map(|blob| MediaDraft::new(MediaKind::Image, blob, &self.previews))
            .collect();
        self.set_images(images);
        Ok(())
    }

    /// Replace the media with a validated gallery video
    pub fn select_video(&mut self, files: Vec<SelectedFile>) -> Result<(), ValidationError> {
        let blob = validate_video(files, &self.limits)?;
        self.set_video(MediaDraft::new(MediaKind::Video, blob, &self.previews));
        Ok(())
    }

    /// Take the media accepted from a capture session
    pub fn attach_capture(&mut self, media: CapturedMedia) {
        match media {
            CapturedMedia::Photo(draft) => self.set_images(vec![draft]),
            CapturedMedia::Video(draft) => self.set_video(draft),
        }
    }

    /// Replace the image list (drops any video and cover)
    pub fn set_images(&mut self, images: Vec<MediaDraft>) {
        self.clear_video();
        debug!(count = images.len(), "Images set");
        self.images = images;
    }

    /// Replace the media with one video (drops any images and cover)
    pub fn set_video(&mut self, video: MediaDraft) {
        self.images.clear();
        self.clear_video();
        debug!(name = video.source().name(), size = video.source().len(), "Video set");
        self.video = Some(video);
    }

    /// Move an image to a new position
    pub fn move_image(&mut self, from: usize, to: usize) -> Result<(), DraftError> {
        let len = self.images.len();
        if from >= len {
            return Err(DraftError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(DraftError::IndexOutOfRange { index: to, len });
        }
        let image = self.images.remove(from);
        self.images.insert(to, image);
        Ok(())
    }

    /// Remove one image, releasing its preview
    pub fn remove_image(&mut self, index: usize) -> Result<(), DraftError> {
        if index >= self.images.len() {
            return Err(DraftError::IndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        self.images.remove(index);
        Ok(())
    }

    /// Record the probed duration of the current video
    ///
    /// Set once: only applied while the video is still unprobed.
    ///
    /// # Returns
    /// * `true` - The value was stored
    /// * `false` - No video, or already probed
    pub fn set_video_meta(&mut self, meta: VideoMeta) -> bool {
        if self.video.is_none() || self.video_meta.is_probed() || !meta.is_probed() {
            return false;
        }
        self.video_meta = meta;
        true
    }

    /// Store the cover; only accepted while a video is present
    pub fn set_cover(&mut self, cover: Cover) -> Result<(), DraftError> {
        if self.video.is_none() {
            warn!("Cover offered without a video");
            return Err(DraftError::CoverWithoutVideo);
        }
        self.cover = Some(cover);
        Ok(())
    }

    /// Drop every image, the video and the cover
    pub fn reset_media(&mut self) {
        self.images.clear();
        self.clear_video();
    }

    fn clear_video(&mut self) {
        self.video = None;
        self.video_meta = VideoMeta::Unprobed;
        self.cover = None;
    }

    pub fn images(&self) -> &[MediaDraft] {
        &self.images
    }

    pub fn video(&self) -> Option<&MediaDraft> {
        self.video.as_ref()
    }

    pub fn video_meta(&self) -> VideoMeta {
        self.video_meta
    }

    pub fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }

    // =========================================================================
    // Text and audience
    // =========================================================================

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        if visibility != self.visibility {
            debug!(?visibility, "Visibility changed");
            self.visibility = visibility;
        }
    }

    // =========================================================================
    // Readiness and submission
    // =========================================================================

    pub fn has_files(&self) -> bool {
        !self.images.is_empty() || self.video.is_some()
    }

    pub fn submitting(&self) -> bool {
        self.post_submitting || self.progress.uploading
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting() && self.has_files() && !self.caption.is_empty()
    }

    pub fn upload_kind(&self) -> UploadKind {
        if self.video.is_some() {
            UploadKind::Video
        } else {
            UploadKind::Images
        }
    }

    pub fn progress(&self) -> SubmissionProgress {
        self.progress
    }

    /// Store progress reported by the submission collaborator
    pub fn apply_progress(&mut self, progress: SubmissionProgress) {
        self.progress = SubmissionProgress {
            uploading: progress.uploading,
            progress_percent: progress.progress_percent.min(100),
        };
    }

    /// Build the payload without changing any state
    pub fn submission_request(&self) -> SubmissionRequest {
        SubmissionRequest {
            kind: self.upload_kind(),
            images: self
                .images
                .iter()
                .map(|draft| SubmissionImage {
                    file: draft.source().clone(),
                    url: draft.preview_url().to_string(),
                })
                .collect(),
            video: self.video.as_ref().map(|draft| draft.source().clone()),
            cover: self.cover.as_ref().map(|cover| cover.image().clone()),
            caption: self.caption.clone(),
            visibility: self.visibility,
        }
    }

    /// Mark the post as submitting and return its payload
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest, DraftError> {
        if !self.can_submit() {
            return Err(DraftError::NotReady);
        }
        self.post_submitting = true;
        self.progress = SubmissionProgress::default();
        Ok(self.submission_request())
    }

    /// Settle a submission; on success the media is released
    pub fn finish_submission(&mut self, result: Result<(), DraftError>) -> Result<(), DraftError> {
        self.post_submitting = false;
        self.progress.uploading = false;
        match result {
            Ok(()) => {
                info!(kind = ?self.upload_kind(), "Post submitted");
                self.reset_media();
                self.caption.clear();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Post submission failed");
                Err(e)
            }
        }
    }

    /// Run a full submission through `service`, storing its progress
    pub async fn submit<S: SubmissionService>(&mut self, service: &S) -> Result<(), DraftError> {
        let request = self.begin_submission()?;
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

        let submission = service.submit(request, progress_tx);
        tokio::pin!(submission);
        let result = loop {
            tokio::select! {
                result = &mut submission => break result,
                Some(progress) = progress_rx.recv() => self.apply_progress(progress),
            }
        };
        while let Ok(progress) = progress_rx.try_recv() {
            self.apply_progress(progress);
        }

        self.finish_submission(result)
    }

    /// Release everything the draft holds
    pub fn discard(&mut self) {
        self.reset_media();
        self.caption.clear();
        self.visibility = Visibility::default();
        self.progress = SubmissionProgress::default();
        self.post_submitting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ObjectUrlStore, ThumbnailCandidate};

    fn draft() -> (PostDraft, ObjectUrlStore) {
        let store = ObjectUrlStore::new();
        let draft = PostDraft::new(Previews::new(store.clone()), SelectionLimits::default());
        (draft, store)
    }

    fn image(name: &str) -> SelectedFile {
        SelectedFile::new(MediaBlob::new(vec![0u8; 16], "image/jpeg", name))
    }

    fn video() -> SelectedFile {
        SelectedFile::new(MediaBlob::new(vec![0u8; 64], "video/mp4", "clip.mp4"))
    }

    #[test]
    fn test_images_and_video_are_exclusive() {
        let (mut draft, store) = draft();
        draft.select_images(vec![image("a.jpg"), image("b.jpg")]).unwrap();
        assert_eq!(draft.upload_kind(), UploadKind::Images);
        assert_eq!(store.live_count(), 2);

        draft.select_video(vec![video()]).unwrap();
        assert!(draft.images().is_empty());
        assert_eq!(draft.upload_kind(), UploadKind::Video);
        assert_eq!(store.live_count(), 1);

        draft.select_images(vec![image("c.jpg")]).unwrap();
        assert!(draft.video().is_none());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_rejected_selection_leaves_draft_untouched() {
        let (mut draft, _store) = draft();
        draft.select_images(vec![image("a.jpg")]).unwrap();
        assert!(draft.select_video(vec![video(), video()]).is_err());
        assert_eq!(draft.images().len(), 1);
    }

    #[test]
    fn test_reorder_and_remove() {
        let (mut draft, store) = draft();
        draft
            .select_images(vec![image("a.jpg"), image("b.jpg"), image("c.jpg")])
            .unwrap();
        draft.move_image(0, 2).unwrap();
        let names: Vec<_> = draft.images().iter().map(|d| d.source().name()).collect();
        assert_eq!(names, ["b.jpg", "c.jpg", "a.jpg"]);

        draft.remove_image(1).unwrap();
        assert_eq!(store.live_count(), 2);
        assert_eq!(
            draft.remove_image(5),
            Err(DraftError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(draft.move_image(0, 2).is_err());
    }

    #[test]
    fn test_video_meta_is_set_once() {
        let (mut draft, _store) = draft();
        assert!(!draft.set_video_meta(VideoMeta::from_secs(3.0)));

        draft.select_video(vec![video()]).unwrap();
        assert!(!draft.set_video_meta(VideoMeta::Unprobed));
        assert!(draft.set_video_meta(VideoMeta::from_secs(3.0)));
        assert!(!draft.set_video_meta(VideoMeta::from_secs(4.0)));
        assert_eq!(draft.video_meta().duration_secs(), Some(3.0));
    }

    #[test]
    fn test_cover_requires_video() {
        let (mut draft, store) = draft();
        let previews = Previews::new(store.clone());
        let frame = MediaBlob::new(vec![0xFF, 0xD8], "image/jpeg", "cover.jpeg");

        let cover = Cover::Frame(ThumbnailCandidate::new(1.0, frame.clone(), &previews));
        assert_eq!(draft.set_cover(cover), Err(DraftError::CoverWithoutVideo));
        assert_eq!(store.live_count(), 0);

        draft.select_video(vec![video()]).unwrap();
        let cover = Cover::Frame(ThumbnailCandidate::new(1.0, frame, &previews));
        draft.set_cover(cover).unwrap();
        assert_eq!(draft.submission_request().cover.map(|c| c.len()), Some(2));

        draft.reset_media();
        assert!(draft.cover().is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_submitting_blocks_submit() {
        let (mut draft, _store) = draft();
        draft.select_images(vec![image("a.jpg")]).unwrap();
        draft.set_caption("hello");
        assert!(draft.can_submit());

        draft.apply_progress(SubmissionProgress {
            uploading: true,
            progress_percent: 140,
        });
        assert!(draft.submitting());
        assert!(!draft.can_submit());
        assert_eq!(draft.progress().progress_percent, 100);
        assert_eq!(draft.begin_submission().unwrap_err(), DraftError::NotReady);
    }

    struct FakeService {
        fail: bool,
    }

    impl SubmissionService for FakeService {
        async fn submit(
            &self,
            request: SubmissionRequest,
            progress: mpsc::UnboundedSender<SubmissionProgress>,
        ) -> Result<(), DraftError> {
            assert_eq!(request.caption, "caption");
            for percent in [25, 50, 100] {
                let _ = progress.send(SubmissionProgress {
                    uploading: true,
                    progress_percent: percent,
                });
                tokio::task::yield_now().await;
            }
            if self.fail {
                Err(DraftError::Submission("server said no".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_submit_stores_progress_and_clears_on_success() {
        let (mut draft, store) = draft();
        draft.select_images(vec![image("a.jpg")]).unwrap();
        draft.set_caption("caption");
        draft.set_visibility(Visibility::Private);

        let err = draft.submit(&FakeService { fail: true }).await.unwrap_err();
        assert!(matches!(err, DraftError::Submission(_)));
        assert_eq!(draft.progress().progress_percent, 100);
        assert!(!draft.submitting());
        assert!(draft.has_files());

        draft.submit(&FakeService { fail: false }).await.unwrap();
        assert!(!draft.has_files());
        assert_eq!(store.live_count(), 0);
    }
}
