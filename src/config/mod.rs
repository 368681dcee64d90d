//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_CHANNELS, DEFAULT_FRAME_LEN, DEFAULT_MARGIN_SECS, DEFAULT_MAX_RETAINED_SECS,
    DEFAULT_MIN_CLIP_SECS, DEFAULT_OUT_DIR, DEFAULT_SAMPLE_RATE, DEFAULT_THRESHOLD,
};

/// CLI options for the voiceclip recorder. Validated values keep the capture
/// pipeline inside safe operating ranges.
#[derive(Debug, Parser, Clone)]
#[command(about = "VoiceClip continuous clip recorder", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Capture sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Captured channel count
    #[arg(long, default_value_t = DEFAULT_CHANNELS)]
    pub channels: u16,

    /// Frame length in samples per channel
    #[arg(long = "frame-len", default_value_t = DEFAULT_FRAME_LEN)]
    pub frame_len: usize,

    /// RMS energy above which a frame counts as voice activity
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,

    /// Trailing silence tolerated before a clip closes (seconds)
    #[arg(long = "margin-secs", default_value_t = DEFAULT_MARGIN_SECS)]
    pub margin_secs: f64,

    /// Minimum clip length that gets persisted (seconds)
    #[arg(long = "min-clip-secs", default_value_t = DEFAULT_MIN_CLIP_SECS)]
    pub min_clip_secs: f64,

    /// Audio retained in the capture queue before old frames are evicted (seconds)
    #[arg(long = "max-retained-secs", default_value_t = DEFAULT_MAX_RETAINED_SECS)]
    pub max_retained_secs: u64,

    /// Directory where finished clips are written
    #[arg(long = "out-dir", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Stop automatically after this many seconds (0 = run until Enter)
    #[arg(long = "run-secs", default_value_t = 0)]
    pub run_secs: u64,

    /// Emit a JSON record line on stdout for each saved clip
    #[arg(long = "json-records", default_value_t = false)]
    pub json_records: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "VOICECLIP_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "VOICECLIP_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

/// Snapshot of the CLI-controlled capture settings handed to the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_device: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_len: usize,
    pub threshold: f32,
    pub margin_secs: f64,
    pub min_clip_secs: f64,
    pub max_retained_secs: u64,
    pub out_dir: PathBuf,
}
