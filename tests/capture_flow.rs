// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end capture sessions against the synthetic camera

use postcam::backends::CameraDevice;
use postcam::backends::synthetic::{SyntheticCamera, SyntheticDecoder};
use postcam::media::{MediaBlob, ObjectUrlStore, PreviewBackend, Previews};
use postcam::pipelines::{CaptureUpdate, CapturedMedia};
use postcam::{CaptureController, CaptureState, Config, FrameExtractor, Gesture, GestureRecognizer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Preview backend that fails loudly on unknown or repeated revocations
#[derive(Default)]
struct CountingBackend {
    next: AtomicUsize,
    live: Mutex<HashSet<String>>,
    revoked: AtomicUsize,
}

impl CountingBackend {
    fn live(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

impl PreviewBackend for CountingBackend {
    fn create(&self, _blob: &MediaBlob) -> String {
        let url = format!("test://{}", self.next.fetch_add(1, Ordering::SeqCst));
        self.live.lock().unwrap().insert(url.clone());
        url
    }

    fn revoke(&self, url: &str) {
        assert!(
            self.live.lock().unwrap().remove(url),
            "revoked unknown or already revoked url {url}"
        );
        self.revoked.fetch_add(1, Ordering::SeqCst);
    }
}

fn open(camera: SyntheticCamera) -> (CaptureController<SyntheticCamera>, ObjectUrlStore) {
    let store = ObjectUrlStore::new();
    let controller = CaptureController::open(camera, &Config::default(), Previews::new(store.clone()));
    (controller, store)
}

#[tokio::test(start_paused = true)]
async fn test_tap_takes_a_photo() {
    let config = Config::default();
    let (mut controller, _store) = open(SyntheticCamera::new(32, 24));
    let (mut recognizer, mut gestures) = GestureRecognizer::new(config.long_press_threshold());

    recognizer.press_start();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!recognizer.press_end());

    let gesture = gestures.recv().await.unwrap();
    assert_eq!(gesture, Gesture::Click);
    controller.handle_gesture(gesture).unwrap();
    assert_eq!(controller.state(), CaptureState::ReviewPhoto);

    let media = controller.accept().unwrap();
    assert!(matches!(media, CapturedMedia::Photo(_)));
    assert_eq!(media.draft().source().mime(), "image/jpeg");
}

#[tokio::test(start_paused = true)]
async fn test_long_press_starts_recording_at_zero() {
    let config = Config::default();
    let (mut controller, _store) = open(SyntheticCamera::new(16, 16));
    let (mut recognizer, mut gestures) = GestureRecognizer::new(config.long_press_threshold());

    recognizer.press_start();
    let gesture = gestures.recv().await.unwrap();
    assert_eq!(gesture, Gesture::LongPress);
    assert!(recognizer.is_long_press());

    controller.handle_gesture(gesture).unwrap();
    assert_eq!(
        controller.state(),
        CaptureState::Recording {
            progress_secs: 0,
            stopping: false
        }
    );
    assert!(controller.recorder_active());

    // Releasing a long press must not produce a click
    assert!(recognizer.press_end());
    controller.release();
    assert!(gestures.try_recv().is_err());

    let update = controller.next_update().await;
    assert!(matches!(update, Some(CaptureUpdate::Finished { .. })), "{update:?}");
}

#[tokio::test(start_paused = true)]
async fn test_holding_past_the_limit_auto_stops() {
    let config = Config::default();
    let (mut controller, _store) = open(SyntheticCamera::new(16, 16));
    let (mut recognizer, mut gestures) = GestureRecognizer::new(config.long_press_threshold());

    recognizer.press_start();
    let release_at = tokio::time::Instant::now() + Duration::from_secs(20);
    controller.handle_gesture(gestures.recv().await.unwrap()).unwrap();

    let mut progress = Vec::new();
    let mut auto_stopped = None;
    loop {
        match controller.next_update().await {
            Some(CaptureUpdate::Progress(secs)) => progress.push(secs),
            Some(CaptureUpdate::AutoStopped(secs)) => auto_stopped = Some(secs),
            Some(CaptureUpdate::Finished { bytes }) => {
                assert!(bytes > 0);
                break;
            }
            other => panic!("unexpected update {other:?}"),
        }
    }
    assert_eq!(progress, (1..14).collect::<Vec<u32>>());
    assert_eq!(auto_stopped, Some(14));
    assert!(progress.iter().all(|&secs| secs <= config.max_recording_secs));
    assert_eq!(controller.state(), CaptureState::ReviewVideo);

    // The user lets go later; the session stays in review
    tokio::time::sleep_until(release_at).await;
    assert!(recognizer.press_end());
    controller.release();
    assert_eq!(controller.state(), CaptureState::ReviewVideo);

    let clip = controller.accept().unwrap().into_draft();
    let extractor = FrameExtractor::new(SyntheticDecoder::default(), config.probe_timeout());
    let meta = extractor.probe_duration(clip.source()).await;
    let duration = meta.duration_secs().unwrap();
    assert!(duration > 0.0 && duration <= 15.0, "{duration}");
}

#[tokio::test(start_paused = true)]
async fn test_preview_handles_released_after_review() {
    let backend = Arc::new(CountingBackend::default());
    let previews = Previews::from_arc(backend.clone());
    let config = Config::default();

    let mut controller =
        CaptureController::open(SyntheticCamera::new(16, 16), &config, previews.clone());

    // Rejected photo: released immediately
    controller.handle_gesture(Gesture::Click).unwrap();
    assert_eq!(backend.live(), 1);
    controller.reject().unwrap();
    assert_eq!(backend.live(), 0);

    // Rejected video
    controller.handle_gesture(Gesture::LongPress).unwrap();
    assert_eq!(controller.next_update().await, Some(CaptureUpdate::Progress(1)));
    controller.release();
    assert!(matches!(
        controller.next_update().await,
        Some(CaptureUpdate::Finished { .. })
    ));
    assert_eq!(backend.live(), 1);
    controller.reject().unwrap();
    assert_eq!(backend.live(), 0);

    // Accepted photo: released once the caller drops it
    controller.handle_gesture(Gesture::Click).unwrap();
    let media = controller.accept().unwrap();
    drop(controller);
    assert_eq!(backend.live(), 1);
    drop(media);

    assert_eq!(backend.live(), 0);
    assert_eq!(backend.revoked.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_denied_camera_reports_unavailable() {
    let (controller, store) = open(SyntheticCamera::default().denied());
    assert_eq!(controller.state(), CaptureState::Unavailable);
    assert!(controller.unavailable_reason().is_some());
    assert!(!controller.camera().is_streaming());
    assert_eq!(store.live_count(), 0);
}
