// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use postcam::constants::{FacingMode, JpegQuality, file_formats, format_elapsed};

#[test]
fn test_facing_mode_flip() {
    assert_eq!(FacingMode::User.flipped(), FacingMode::Environment);
    assert_eq!(FacingMode::Environment.flipped(), FacingMode::User);
    assert_eq!(FacingMode::User.flipped().flipped(), FacingMode::User);
}

#[test]
fn test_jpeg_quality_values() {
    assert_eq!(JpegQuality::Scrub.value(), 50);
    assert_eq!(JpegQuality::Cover.value(), 92);
    assert_eq!(JpegQuality::default(), JpegQuality::Cover);
}

#[test]
fn test_format_elapsed() {
    assert_eq!(format_elapsed(0), "00:00");
    assert_eq!(format_elapsed(7), "00:07");
    assert_eq!(format_elapsed(14), "00:14");
    assert_eq!(format_elapsed(75), "01:15");
}

#[test]
fn test_file_formats() {
    assert!(file_formats::is_image_extension("jpeg"));
    assert!(file_formats::is_video_extension("mp4"));
    assert!(!file_formats::is_image_extension("mp4"));
    assert_eq!(file_formats::mime_for_extension("jpg"), "image/jpeg");
    assert_eq!(
        file_formats::mime_for_extension("synv"),
        postcam::backends::synthetic::SYNTHETIC_MIME
    );
    assert_eq!(
        file_formats::mime_for_extension("xyz"),
        "application/octet-stream"
    );
}
