use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Lock-free live input level shared between the frame pump and a UI thread.
/// Stores the most recent frame RMS; readers poll at their own cadence.
#[derive(Clone, Debug)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0f32.to_bits())),
        }
    }

    pub fn set_level(&self, rms: f32) {
        self.level_bits.store(rms.to_bits(), Ordering::Relaxed);
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

impl Default for LiveMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_meter_defaults_to_silence() {
        let meter = LiveMeter::new();
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn live_meter_updates_level() {
        let meter = LiveMeter::new();
        meter.set_level(0.25);
        assert_eq!(meter.level(), 0.25);
    }

    #[test]
    fn live_meter_clones_share_state() {
        let meter = LiveMeter::new();
        let reader = meter.clone();
        meter.set_level(0.5);
        assert_eq!(reader.level(), 0.5);
    }
}
