use super::*;
use clap::Parser;
use std::path::PathBuf;

fn parsed(args: &[&str]) -> AppConfig {
    let mut full = vec!["voiceclip"];
    full.extend_from_slice(args);
    AppConfig::parse_from(full)
}

fn valid_config() -> AppConfig {
    let mut config = parsed(&[]);
    config.validate().expect("defaults should be valid");
    config
}

#[test]
fn defaults_match_documented_values() {
    let config = valid_config();
    assert_eq!(config.sample_rate, 44_100);
    assert_eq!(config.channels, 1);
    assert_eq!(config.frame_len, 1024);
    assert_eq!(config.threshold, 0.01);
    assert_eq!(config.margin_secs, 0.5);
    assert_eq!(config.min_clip_secs, 1.0);
    assert_eq!(config.max_retained_secs, 60);
    assert_eq!(config.out_dir, PathBuf::from("clips"));
    assert_eq!(config.run_secs, 0);
    assert!(!config.json_records);
}

#[test]
fn rejects_out_of_range_sample_rate() {
    let mut config = parsed(&["--sample-rate", "4000"]);
    let err = config.validate().expect_err("4 kHz is below the floor");
    assert!(err.to_string().contains("--sample-rate"));

    let mut config = parsed(&["--sample-rate", "250000"]);
    assert!(config.validate().is_err());
}

#[test]
fn rejects_zero_and_excessive_channels() {
    let mut config = parsed(&["--channels", "0"]);
    assert!(config.validate().is_err());

    let mut config = parsed(&["--channels", "17"]);
    let err = config.validate().expect_err("17 channels is above the cap");
    assert!(err.to_string().contains("--channels"));
}

#[test]
fn rejects_out_of_range_frame_len() {
    let mut config = parsed(&["--frame-len", "32"]);
    assert!(config.validate().is_err());

    let mut config = parsed(&["--frame-len", "131072"]);
    assert!(config.validate().is_err());
}

#[test]
fn rejects_threshold_outside_unit_range() {
    let mut config = parsed(&["--threshold", "1.0"]);
    let err = config.validate().expect_err("threshold 1.0 means no frame can activate");
    assert!(err.to_string().contains("--threshold"));

    let mut config = parsed(&["--threshold", "-0.1"]);
    assert!(config.validate().is_err());

    let mut config = parsed(&["--threshold", "NaN"]);
    assert!(config.validate().is_err());
}

#[test]
fn accepts_zero_margin_and_zero_min_clip() {
    let mut config = parsed(&["--margin-secs", "0", "--min-clip-secs", "0"]);
    config
        .validate()
        .expect("zero margin closes clips on the first silent frame");
}

#[test]
fn rejects_excessive_margin_and_min_clip() {
    let mut config = parsed(&["--margin-secs", "11"]);
    assert!(config.validate().is_err());

    let mut config = parsed(&["--min-clip-secs", "61"]);
    assert!(config.validate().is_err());
}

#[test]
fn rejects_retention_that_cannot_hold_one_frame() {
    let mut config = parsed(&["--max-retained-secs", "0"]);
    assert!(config.validate().is_err());

    let mut config = parsed(&["--max-retained-secs", "601"]);
    assert!(config.validate().is_err());

    // One second of retention cannot hold a single 65536-sample frame at 8 kHz.
    let mut config = parsed(&[
        "--max-retained-secs",
        "1",
        "--frame-len",
        "65536",
        "--sample-rate",
        "8000",
    ]);
    let err = config.validate().expect_err("queue must hold at least one frame");
    assert!(err.to_string().contains("less than one frame"));
}

#[test]
fn rejects_empty_out_dir() {
    let mut config = parsed(&["--out-dir", ""]);
    let err = config.validate().expect_err("empty out dir is unusable");
    assert!(err.to_string().contains("--out-dir"));
}

#[test]
fn pipeline_config_maps_fields() {
    let mut config = parsed(&[
        "--input-device",
        "USB Mic",
        "--sample-rate",
        "16000",
        "--channels",
        "2",
        "--frame-len",
        "320",
        "--threshold",
        "0.02",
        "--margin-secs",
        "0.25",
        "--min-clip-secs",
        "2.5",
        "--max-retained-secs",
        "30",
        "--out-dir",
        "captures",
    ]);
    config.validate().expect("explicit values should be valid");

    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.input_device.as_deref(), Some("USB Mic"));
    assert_eq!(pipeline.sample_rate, 16_000);
    assert_eq!(pipeline.channels, 2);
    assert_eq!(pipeline.frame_len, 320);
    assert_eq!(pipeline.threshold, 0.02);
    assert_eq!(pipeline.margin_secs, 0.25);
    assert_eq!(pipeline.min_clip_secs, 2.5);
    assert_eq!(pipeline.max_retained_secs, 30);
    assert_eq!(pipeline.out_dir, PathBuf::from("captures"));
}
