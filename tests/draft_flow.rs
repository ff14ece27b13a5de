// SPDX-License-Identifier: GPL-3.0-only

//! Gallery selection, probing and cover selection feeding a post draft

use postcam::backends::synthetic::{DecoderBehavior, SYNTHETIC_MIME, SyntheticClip, SyntheticDecoder};
use postcam::config::SelectionLimits;
use postcam::errors::{DraftError, ValidationReason};
use postcam::media::{ObjectUrlStore, Previews, SelectedFile};
use postcam::pipelines::{DragBounds, StripGeometry, ThumbnailScrubber, strip_count, strip_timestamps};
use postcam::{Config, Cover, FrameExtractor, MediaBlob, PostDraft, UploadKind, VideoMeta};
use std::time::Duration;

const MB: usize = 1024 * 1024;

fn jpeg(name: &str, size: usize) -> SelectedFile {
    SelectedFile::new(MediaBlob::new(vec![0u8; size], "image/jpeg", name))
}

fn clip(secs: usize) -> MediaBlob {
    MediaBlob::new(SyntheticClip::new(16, 12, secs).encode(), SYNTHETIC_MIME, "clip.synv")
}

fn draft() -> (PostDraft, ObjectUrlStore) {
    let store = ObjectUrlStore::new();
    let draft = PostDraft::new(Previews::new(store.clone()), SelectionLimits::default());
    (draft, store)
}

#[test]
fn test_images_keep_selection_order() {
    let (mut draft, store) = draft();
    draft
        .select_images(vec![
            jpeg("a.jpg", 2 * MB),
            jpeg("b.jpg", MB),
            jpeg("c.jpg", MB / 2),
        ])
        .unwrap();

    let names: Vec<_> = draft.images().iter().map(|i| i.source().name()).collect();
    assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
    assert!(draft.has_files());
    assert_eq!(draft.upload_kind(), UploadKind::Images);
    assert_eq!(store.live_count(), 3);

    // A caption is still required
    assert!(!draft.can_submit());
    draft.set_caption("First post");
    assert!(draft.can_submit());
}

#[test]
fn test_oversized_image_rejects_whole_selection() {
    let (mut draft, store) = draft();
    draft.select_images(vec![jpeg("keep.jpg", MB)]).unwrap();

    let err = draft
        .select_images(vec![jpeg("ok.jpg", MB), jpeg("huge.jpg", 6 * MB)])
        .unwrap_err();
    assert!(matches!(err.reason, ValidationReason::TooLarge { .. }));

    // Previous selection survives
    assert_eq!(draft.images().len(), 1);
    assert_eq!(draft.images()[0].source().name(), "keep.jpg");
    assert_eq!(store.live_count(), 1);
}

#[test]
fn test_reorder_and_remove() {
    let (mut draft, store) = draft();
    draft
        .select_images(vec![jpeg("a.jpg", 10), jpeg("b.jpg", 10), jpeg("c.jpg", 10)])
        .unwrap();

    draft.move_image(2, 0).unwrap();
    draft.remove_image(1).unwrap();
    let names: Vec<_> = draft.images().iter().map(|i| i.source().name()).collect();
    assert_eq!(names, ["c.jpg", "b.jpg"]);
    assert_eq!(store.live_count(), 2);

    assert_eq!(
        draft.remove_image(5),
        Err(DraftError::IndexOutOfRange { index: 5, len: 2 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_probe_finite_and_indeterminate() {
    let timeout = Duration::from_secs(5);
    let blob = clip(6);

    let finite = FrameExtractor::new(SyntheticDecoder::default(), timeout);
    assert_eq!(
        finite.probe_duration(&blob).await,
        VideoMeta::Probed { duration_secs: 6.0 }
    );

    let indeterminate = FrameExtractor::new(SyntheticDecoder::new(DecoderBehavior::Indeterminate), timeout);
    assert_eq!(
        indeterminate.probe_duration(&blob).await,
        VideoMeta::Probed { duration_secs: 6.0 }
    );

    let unresolvable = FrameExtractor::new(SyntheticDecoder::new(DecoderBehavior::Unresolvable), timeout);
    assert_eq!(unresolvable.probe_duration(&blob).await, VideoMeta::Unavailable);
}

#[test]
fn test_strip_layout() {
    assert_eq!(strip_count(None, 34), 9);
    assert_eq!(strip_count(Some(306), 34), 9);
    assert_eq!(strip_count(Some(307), 34), 10);
    assert_eq!(strip_timestamps(9.0, 3), vec![0.0, 3.0, 6.0]);

    let bounds = DragBounds::new(306, 36);
    assert_eq!(bounds.right, 270.0);
    assert_eq!(bounds.offset_to_timestamp(135.0, 10.0), 5.0);
    assert_eq!(bounds.offset_to_timestamp(-20.0, 10.0), 0.0);
    assert_eq!(bounds.offset_to_timestamp(400.0, 10.0), 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_video_with_scrubbed_cover() {
    let config = Config::default();
    let store = ObjectUrlStore::new();
    let previews = Previews::new(store.clone());
    let mut draft = PostDraft::new(previews.clone(), config.limits.clone());

    let blob = clip(9);
    draft
        .select_video(vec![SelectedFile::new(blob.clone())])
        .unwrap();
    assert_eq!(draft.upload_kind(), UploadKind::Video);

    let extractor = FrameExtractor::new(SyntheticDecoder::default(), config.probe_timeout());
    let meta = extractor.probe_duration(&blob).await;
    assert!(draft.set_video_meta(meta));
    assert!(!draft.set_video_meta(VideoMeta::from_secs(1.0)));

    let mut scrubber = ThumbnailScrubber::new(StripGeometry::from(&config), previews);
    scrubber.set_container_width(306);
    scrubber.set_duration(meta);
    assert!(scrubber.should_rebuild());

    let mut session = extractor.open(&blob, meta.duration_secs()).await.unwrap();
    assert_eq!(scrubber.build_strip(&mut session).await, 9);
    assert_eq!(
        scrubber.selected().and_then(|cover| cover.timestamp_secs()),
        Some(1.0)
    );

    let cover = scrubber.release_drag(135.0, &mut session).await.unwrap();
    assert_eq!(cover.timestamp_secs(), Some(4.5));
    let cover = scrubber.promote_cover().unwrap();
    assert!(matches!(cover, Cover::Frame(_)));
    drop(session);

    // Strip handles are gone once the cover is promoted
    assert_eq!(store.live_count(), 2);
    draft.set_cover(cover).unwrap();
    draft.set_caption("Clip");
    assert!(draft.can_submit());

    let request = draft.submission_request();
    assert_eq!(request.kind, UploadKind::Video);
    assert!(request.cover.is_some());

    drop(scrubber);
    draft.discard();
    assert_eq!(store.live_count(), 0);
}

#[test]
fn test_cover_requires_video() {
    let (mut draft, _store) = draft();
    let previews = Previews::new(ObjectUrlStore::new());
    let gallery = postcam::MediaDraft::new(
        postcam::MediaKind::Image,
        MediaBlob::new(vec![1, 2, 3], "image/jpeg", "cover.jpg"),
        &previews,
    );
    assert_eq!(
        draft.set_cover(Cover::Gallery(gallery)),
        Err(DraftError::CoverWithoutVideo)
    );
}

#[tokio::test(start_paused = true)]
async fn test_strip_waits_for_slow_metadata() {
    let config = Config::default();
    let blob = clip(6);
    let extractor = FrameExtractor::new(
        SyntheticDecoder::new(DecoderBehavior::LateMetadata),
        config.probe_timeout(),
    );
    let meta = extractor.probe_duration(&blob).await;
    assert_eq!(meta.duration_secs(), Some(6.0));

    let mut scrubber = ThumbnailScrubber::new(
        StripGeometry::from(&config),
        Previews::new(ObjectUrlStore::new()),
    );
    scrubber.set_container_width(306);
    scrubber.set_duration(meta);

    let start = tokio::time::Instant::now();
    let mut session = extractor.open(&blob, meta.duration_secs()).await.unwrap();
    assert_eq!(scrubber.build_strip(&mut session).await, 9);
    assert!(scrubber.strip()[0].is_some());
    assert!(start.elapsed() < config.probe_timeout());
}
