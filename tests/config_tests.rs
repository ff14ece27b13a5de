// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use postcam::{Config, FacingMode};

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert_eq!(config.default_facing, FacingMode::User);
    assert_eq!(config.max_recording_secs, 14);
    assert_eq!(config.long_press_threshold().as_millis(), 500);
}

#[test]
fn test_config_strip_geometry_defaults() {
    let config = Config::default();
    assert_eq!(config.strip_item_width, 34);
    assert_eq!(config.strip_item_height, 44);
    assert_eq!(config.handle_width, 36);
    assert!(config.scrub_quality < config.cover_quality);
}

#[test]
fn test_config_selection_limits() {
    let config = Config::default();
    assert_eq!(config.limits.max_images, 10);
    assert!(config.limits.image_size_limit < config.limits.video_size_limit);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let path = std::env::temp_dir()
        .join(format!("postcam-missing-{}", uuid::Uuid::new_v4()))
        .join("config.json");
    assert_eq!(Config::load_from(&path), Config::default());
}

#[test]
fn test_config_clamps_out_of_range_values() {
    let dir = std::env::temp_dir().join(format!("postcam-clamp-{}", uuid::Uuid::new_v4()));
    let path = dir.join("config.json");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        &path,
        r#"{ "max_recording_secs": 0, "cover_quality": 250, "strip_item_width": 0 }"#,
    )
    .unwrap();

    let config = Config::load_from(&path);
    assert_eq!(config.max_recording_secs, 1);
    assert_eq!(config.cover_quality, 100);
    assert_eq!(config.strip_item_width, 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
