use super::defaults::{
    MAX_CHANNELS, MAX_FRAME_LEN, MAX_MARGIN_SECS, MAX_MIN_CLIP_SECS, MAX_RETAINED_HARD_LIMIT_SECS,
    MAX_RUN_SECS, MAX_SAMPLE_RATE, MIN_FRAME_LEN, MIN_SAMPLE_RATE,
};
use super::{AppConfig, PipelineConfig};
use anyhow::{bail, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and keep the pipeline inside safe operating ranges.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            );
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            bail!(
                "--channels must be between 1 and {MAX_CHANNELS}, got {}",
                self.channels
            );
        }
        if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&self.frame_len) {
            bail!(
                "--frame-len must be between {MIN_FRAME_LEN} and {MAX_FRAME_LEN} samples, got {}",
                self.frame_len
            );
        }
        if !self.threshold.is_finite() || !(0.0..1.0).contains(&self.threshold) {
            bail!(
                "--threshold must be a finite RMS value in [0.0, 1.0), got {}",
                self.threshold
            );
        }
        if !self.margin_secs.is_finite() || !(0.0..=MAX_MARGIN_SECS).contains(&self.margin_secs) {
            bail!(
                "--margin-secs must be between 0.0 and {MAX_MARGIN_SECS}, got {}",
                self.margin_secs
            );
        }
        if !self.min_clip_secs.is_finite()
            || !(0.0..=MAX_MIN_CLIP_SECS).contains(&self.min_clip_secs)
        {
            bail!(
                "--min-clip-secs must be between 0.0 and {MAX_MIN_CLIP_SECS}, got {}",
                self.min_clip_secs
            );
        }
        if self.max_retained_secs == 0 || self.max_retained_secs > MAX_RETAINED_HARD_LIMIT_SECS {
            bail!(
                "--max-retained-secs must be between 1 and {MAX_RETAINED_HARD_LIMIT_SECS}, got {}",
                self.max_retained_secs
            );
        }
        // The capture queue must hold at least one frame, or every frame
        // would be evicted on arrival.
        let frames_per_sec = f64::from(self.sample_rate) / self.frame_len as f64;
        if (self.max_retained_secs as f64) * frames_per_sec < 1.0 {
            bail!(
                "--max-retained-secs {} retains less than one frame at {} samples / {} Hz",
                self.max_retained_secs,
                self.frame_len,
                self.sample_rate
            );
        }
        if self.run_secs > MAX_RUN_SECS {
            bail!("--run-secs must be at most {MAX_RUN_SECS}, got {}", self.run_secs);
        }
        if self.out_dir.as_os_str().is_empty() {
            bail!("--out-dir must not be empty");
        }

        Ok(())
    }

    /// Snapshot the capture settings for the pipeline.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_device: self.input_device.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_len: self.frame_len,
            threshold: self.threshold,
            margin_secs: self.margin_secs,
            min_clip_secs: self.min_clip_secs,
            max_retained_secs: self.max_retained_secs,
            out_dir: self.out_dir.clone(),
        }
    }
}
