// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Simulating a capture session against the synthetic camera
//! - Validating gallery selections from disk
//! - Probing durations and extracting strip / cover frames

use postcam::Config;
use postcam::backends::VideoDecoder;
use postcam::backends::synthetic::{SYNTHETIC_MIME, SyntheticCamera, SyntheticDecoder};
use postcam::constants::format_elapsed;
use postcam::draft::PostDraft;
use postcam::media::{
    MediaBlob, ObjectUrlStore, Previews, SelectedFile, VideoMeta, validate_images, validate_video,
};
use postcam::pipelines::{
    CaptureController, CaptureUpdate, FrameExtractor, GestureRecognizer, StripGeometry,
    ThumbnailScrubber,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest hold the simulation accepts
const MAX_HOLD_SECS: f64 = 3600.0;

/// Strip width used when the simulation picks a cover
const SIMULATED_STRIP_WIDTH: u32 = 306;

// =============================================================================
// simulate
// =============================================================================

/// Press the shutter for `hold` seconds (or tap) and walk the session through review
pub fn simulate(config: &Config, hold: f64, tap: bool) -> Result<(), Box<dyn Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(simulate_session(config, hold, tap))
}

async fn simulate_session(config: &Config, hold: f64, tap: bool) -> Result<(), Box<dyn Error>> {
    let store = ObjectUrlStore::new();
    let previews = Previews::new(store.clone());

    let mut controller =
        CaptureController::open(SyntheticCamera::default(), config, previews.clone());
    if let Some(reason) = controller.unavailable_reason() {
        return Err(reason.to_string().into());
    }
    println!(
        "Camera: {} ({} available)",
        controller.facing().display_name(),
        controller.camera_count()
    );

    let hold = if tap {
        Duration::from_millis(100)
    } else {
        Duration::from_secs_f64(hold.clamp(0.0, MAX_HOLD_SECS))
    };
    let (mut recognizer, mut gestures) = GestureRecognizer::new(config.long_press_threshold());

    recognizer.press_start();
    let release = tokio::time::sleep(hold);
    tokio::pin!(release);

    loop {
        tokio::select! {
            _ = &mut release => break,
            Some(gesture) = gestures.recv() => {
                println!("Gesture: {:?}", gesture);
                controller.handle_gesture(gesture)?;
                println!("State: {:?}", controller.state());
            }
            Some(update) = controller.next_update(), if controller.is_recording() => {
                report(&update, controller.max_duration_secs());
            }
        }
    }

    let long_press_ended = recognizer.press_end();
    while let Ok(gesture) = gestures.try_recv() {
        println!("Gesture: {:?}", gesture);
        controller.handle_gesture(gesture)?;
    }
    if long_press_ended {
        controller.release();
    }
    while let Some(update) = controller.next_update().await {
        report(&update, controller.max_duration_secs());
    }
    println!("State: {:?}", controller.state());

    if !controller.state().is_review() {
        println!("Nothing captured");
        return Ok(());
    }

    let mut draft = PostDraft::new(previews.clone(), config.limits.clone());
    draft.attach_capture(controller.accept()?);
    drop(controller);

    if let Some(video) = draft.video() {
        let blob = video.source().clone();
        let extractor = FrameExtractor::new(SyntheticDecoder::default(), config.probe_timeout());
        let meta = extractor.probe_duration(&blob).await;
        draft.set_video_meta(meta);
        println!("Duration: {}", describe_meta(meta));

        let mut scrubber = ThumbnailScrubber::new(StripGeometry::from(config), previews.clone());
        scrubber.set_container_width(SIMULATED_STRIP_WIDTH);
        scrubber.set_duration(meta);
        if scrubber.should_rebuild() {
            let mut session = extractor.open(&blob, meta.duration_secs()).await?;
            let filled = scrubber.build_strip(&mut session).await;
            println!("Strip: {}/{} thumbnails", filled, scrubber.count());

            let middle = SIMULATED_STRIP_WIDTH.saturating_sub(config.handle_width) as f64 / 2.0;
            scrubber.release_drag(middle, &mut session).await?;
            if let Some(cover) = scrubber.promote_cover() {
                println!(
                    "Cover: {:.2}s ({} bytes)",
                    cover.timestamp_secs().unwrap_or_default(),
                    cover.image().len()
                );
                draft.set_cover(cover)?;
            }
        }
    }

    println!(
        "Draft: {:?}, {} image(s), video: {}, can submit: {}",
        draft.upload_kind(),
        draft.images().len(),
        draft.video().is_some(),
        draft.can_submit()
    );
    draft.set_caption("Simulated post");
    println!("With caption, can submit: {}", draft.can_submit());

    drop(draft);
    println!("Live preview handles: {}", store.live_count());
    Ok(())
}

fn report(update: &CaptureUpdate, max_secs: u32) {
    match update {
        CaptureUpdate::Progress(secs) => {
            println!("Recording {} / {}", format_elapsed(*secs), format_elapsed(max_secs))
        }
        CaptureUpdate::AutoStopped(secs) => {
            println!("Maximum duration reached at {}", format_elapsed(*secs))
        }
        CaptureUpdate::Finished { bytes } => println!("Recording finished ({} bytes)", bytes),
        CaptureUpdate::Failed(e) => println!("Recording failed: {}", e),
    }
}

fn describe_meta(meta: VideoMeta) -> String {
    match meta {
        VideoMeta::Probed { duration_secs } => format!("{:.3}s", duration_secs),
        VideoMeta::Unavailable => "unavailable".to_string(),
        VideoMeta::Unprobed => "not probed".to_string(),
    }
}

// =============================================================================
// validate
// =============================================================================

/// Run gallery validation over files from disk
pub fn validate(config: &Config, paths: &[PathBuf], video: bool) -> Result<(), Box<dyn Error>> {
    let files = paths
        .iter()
        .map(|path| SelectedFile::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let accepted = if video {
        vec![validate_video(files, &config.limits)?]
    } else {
        validate_images(files, &config.limits)?
    };

    println!("Accepted {} file(s):", accepted.len());
    for blob in &accepted {
        println!("  {} ({}, {} bytes)", blob.name(), blob.mime(), blob.len());
    }
    Ok(())
}

// =============================================================================
// probe / strip / cover
// =============================================================================

/// Which decoder handles a file
enum Source {
    Synthetic,
    #[cfg(feature = "gstreamer")]
    Gst,
}

#[cfg(feature = "gstreamer")]
fn container_source() -> Result<Source, Box<dyn Error>> {
    Ok(Source::Gst)
}

#[cfg(not(feature = "gstreamer"))]
fn container_source() -> Result<Source, Box<dyn Error>> {
    Err("Only .synv clips are supported; rebuild with --features gstreamer".into())
}

/// Extraction job run against a decoder
enum Job<'a> {
    Probe,
    Strip { width: u32, output: &'a Path },
    Cover { at: f64, output: &'a Path },
}

fn load_video(path: &Path) -> Result<(MediaBlob, Source), Box<dyn Error>> {
    let blob = SelectedFile::from_path(path)?.blob;
    let source = if blob.mime() == SYNTHETIC_MIME {
        Source::Synthetic
    } else {
        container_source()?
    };
    Ok((blob, source))
}

fn dispatch(config: &Config, path: &Path, job: Job<'_>) -> Result<(), Box<dyn Error>> {
    let (blob, source) = load_video(path)?;
    let rt = tokio::runtime::Runtime::new()?;
    match source {
        Source::Synthetic => rt.block_on(run_job(
            config,
            FrameExtractor::new(SyntheticDecoder::default(), config.probe_timeout()),
            &blob,
            job,
        )),
        #[cfg(feature = "gstreamer")]
        Source::Gst => rt.block_on(run_job(
            config,
            FrameExtractor::new(postcam::backends::gst::GstDecoder, config.probe_timeout()),
            &blob,
            job,
        )),
    }
}

async fn run_job<D: VideoDecoder>(
    config: &Config,
    extractor: FrameExtractor<D>,
    blob: &MediaBlob,
    job: Job<'_>,
) -> Result<(), Box<dyn Error>> {
    let meta = extractor.probe_duration(blob).await;
    println!("Duration: {}", describe_meta(meta));

    match job {
        Job::Probe => Ok(()),
        Job::Strip { width, output } => {
            let duration = meta.duration_secs().ok_or("Video duration unavailable")?;
            let store = ObjectUrlStore::new();
            let mut scrubber =
                ThumbnailScrubber::new(StripGeometry::from(config), Previews::new(store));
            scrubber.set_container_width(width);
            scrubber.set_duration(meta);

            let mut session = extractor.open(blob, Some(duration)).await?;
            let filled = scrubber.build_strip(&mut session).await;

            std::fs::create_dir_all(output)?;
            for (index, slot) in scrubber.strip().iter().enumerate() {
                match slot {
                    Some(candidate) => {
                        let path = output.join(format!("strip_{:02}.jpeg", index));
                        std::fs::write(&path, candidate.image().bytes())?;
                        println!("  {:>7.3}s -> {}", candidate.timestamp_secs(), path.display());
                    }
                    None => println!("  slot {} failed", index),
                }
            }
            println!("Strip: {}/{} thumbnails", filled, scrubber.count());
            Ok(())
        }
        Job::Cover { at, output } => {
            let jpeg = extractor
                .capture_cover(blob, at, meta.duration_secs())
                .await?;
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(output, &jpeg)?;
            println!("Cover written to {} ({} bytes)", output.display(), jpeg.len());
            Ok(())
        }
    }
}

/// Probe the duration of a video file
pub fn probe(config: &Config, path: &Path) -> Result<(), Box<dyn Error>> {
    dispatch(config, path, Job::Probe)
}

/// Write the scrub strip of a video file to `output`
pub fn strip(config: &Config, path: &Path, width: u32, output: &Path) -> Result<(), Box<dyn Error>> {
    dispatch(config, path, Job::Strip { width, output })
}

/// Write a full-size cover frame of a video file to `output`
pub fn cover(config: &Config, path: &Path, at: f64, output: &Path) -> Result<(), Box<dyn Error>> {
    dispatch(config, path, Job::Cover { at, output })
}
