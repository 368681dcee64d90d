//! WAV serialization for finished clips.
//!
//! Normalized float samples become 16-bit signed PCM in a standard
//! uncompressed WAV container. File names are derived from the wall-clock
//! close time and the whole-second duration
//! (`clip_<YYYYMMDD_HHMMSS>_<duration_seconds>.wav`), so downstream consumers
//! can recover close time, approximate start time, and duration from the name
//! without reading file content.

use super::segmenter::ClipBuffer;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A persisted clip: where it landed and how long it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedClip {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// Writes clip buffers into an output directory as 16-bit PCM WAV files.
#[derive(Debug)]
pub struct ClipEncoder {
    out_dir: PathBuf,
}

impl ClipEncoder {
    /// Bind the encoder to an output directory, creating it if needed.
    pub fn create(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create clip directory '{}'", out_dir.display()))?;
        Ok(Self { out_dir })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Serialize a buffer, timestamping the file with the current local time.
    ///
    /// An unwritable directory surfaces as an I/O error; the pipeline treats
    /// that as a lost clip, not a fatal condition.
    pub fn encode(
        &self,
        buffer: &ClipBuffer,
        sample_rate: u32,
        channels: u16,
    ) -> Result<EncodedClip> {
        self.encode_at(buffer, sample_rate, channels, Local::now())
    }

    /// Timestamp-injectable variant so tests get deterministic names.
    pub fn encode_at(
        &self,
        buffer: &ClipBuffer,
        sample_rate: u32,
        channels: u16,
        closed_at: DateTime<Local>,
    ) -> Result<EncodedClip> {
        let duration_secs = buffer.duration_secs();
        let file_name = format!(
            "clip_{}_{}.wav",
            closed_at.format("%Y%m%d_%H%M%S"),
            duration_secs as u64
        );
        let path = self.out_dir.join(file_name);

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("failed to create clip file '{}'", path.display()))?;
        for frame in buffer.frames() {
            for &sample in frame.samples() {
                writer
                    .write_sample((sample.clamp(-1.0, 1.0) * 32_767.0) as i16)
                    .with_context(|| format!("failed to write clip '{}'", path.display()))?;
            }
        }
        writer
            .finalize()
            .with_context(|| format!("failed to finalize clip '{}'", path.display()))?;

        Ok(EncodedClip {
            path,
            duration_secs,
        })
    }
}

/// Metadata recovered from a clip file name alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    /// Wall-clock time the clip closed, as encoded in the name.
    pub closed_at: NaiveDateTime,
    /// Whole-second duration as encoded in the name.
    pub duration_secs: u64,
}

impl ClipMetadata {
    /// Approximate start time, derived as close time minus duration.
    pub fn started_at(&self) -> NaiveDateTime {
        self.closed_at - ChronoDuration::seconds(self.duration_secs as i64)
    }
}

/// Parse `clip_<YYYYMMDD_HHMMSS>_<duration>.wav` back into its metadata.
/// Returns `None` for names that don't follow the convention.
pub fn parse_clip_name(path: &Path) -> Option<ClipMetadata> {
    static CLIP_NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = CLIP_NAME_RE.get_or_init(|| {
        Regex::new(r"^clip_(\d{8})_(\d{6})_(\d+)\.wav$").expect("clip name regex should compile")
    });

    let name = path.file_name()?.to_str()?;
    let captures = re.captures(name)?;
    let stamp = format!("{}_{}", &captures[1], &captures[2]);
    let closed_at = NaiveDateTime::parse_from_str(&stamp, "%Y%m%d_%H%M%S").ok()?;
    let duration_secs = captures[3].parse().ok()?;
    Some(ClipMetadata {
        closed_at,
        duration_secs,
    })
}
