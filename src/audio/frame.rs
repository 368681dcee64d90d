/// One fixed-length delivery unit of captured audio.
///
/// Samples are interleaved normalized floats in `[-1, 1]`, tagged with the
/// channel count and sample rate they were captured at. Frames are immutable
/// once built; the segmenter either drops them or retains them inside an open
/// clip buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration covered by this frame in seconds (per-channel length over the
    /// capture rate).
    pub fn duration_secs(&self) -> f64 {
        let per_channel = self.samples.len() / usize::from(self.channels);
        per_channel as f64 / f64::from(self.sample_rate)
    }

    /// Root-mean-square amplitude across all interleaved samples, the
    /// activity-detection signal for the segmenter.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let energy: f32 =
            self.samples.iter().map(|s| s * s).sum::<f32>() / self.samples.len() as f32;
        energy.sqrt()
    }
}
