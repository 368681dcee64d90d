//! Default values for the capture pipeline, shared by CLI parsing and tests.

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_FRAME_LEN: usize = 1024;
pub const DEFAULT_THRESHOLD: f32 = 0.01;
pub const DEFAULT_MARGIN_SECS: f64 = 0.5;
pub const DEFAULT_MIN_CLIP_SECS: f64 = 1.0;
pub const DEFAULT_MAX_RETAINED_SECS: u64 = 60;
pub const DEFAULT_OUT_DIR: &str = "clips";

pub(crate) const MIN_SAMPLE_RATE: u32 = 8_000;
pub(crate) const MAX_SAMPLE_RATE: u32 = 192_000;
pub(crate) const MAX_CHANNELS: u16 = 16;
pub(crate) const MIN_FRAME_LEN: usize = 64;
pub(crate) const MAX_FRAME_LEN: usize = 65_536;
pub(crate) const MAX_MARGIN_SECS: f64 = 10.0;
pub(crate) const MAX_MIN_CLIP_SECS: f64 = 60.0;
pub(crate) const MAX_RETAINED_HARD_LIMIT_SECS: u64 = 600;
pub(crate) const MAX_RUN_SECS: u64 = 86_400;
