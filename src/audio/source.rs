//! Continuous frame capture from a CPAL input device.
//!
//! The hardware callback chunks incoming samples into fixed-size frames and
//! hands them to the processing thread through a bounded channel. When the
//! channel is full the oldest unread frame is evicted before the new one is
//! inserted: the queue deliberately favors recency over completeness so the
//! capture callback never stalls. Evictions are counted, not raised as errors.

use super::frame::AudioFrame;
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Capture parameters for a [`FrameSource`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frame length in samples per channel.
    pub frame_len: usize,
    /// Upper bound on buffered audio; beyond it the oldest frame is evicted.
    pub max_retained_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            frame_len: 1024,
            max_retained_secs: 60,
        }
    }
}

impl SourceConfig {
    /// Number of frames the capture queue holds before eviction kicks in.
    pub fn queue_capacity(&self) -> usize {
        let frames =
            (self.max_retained_secs * u64::from(self.sample_rate)) / self.frame_len.max(1) as u64;
        (frames as usize).max(1)
    }

    /// Duration of one frame, also the poll interval for the reader side.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_len.max(1) as f64 / f64::from(self.sample_rate.max(1)))
    }

    fn interleaved_frame_samples(&self) -> usize {
        self.frame_len.max(1) * usize::from(self.channels.max(1))
    }
}

/// Audio input device wrapper.
///
/// Abstracts CPAL device enumeration and selection so users can pick the right
/// microphone when a machine exposes multiple inputs.
pub struct InputDevice {
    device: cpal::Device,
}

impl InputDevice {
    /// List input device names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open a device, optionally forcing a specific one by name. Failure here
    /// is fatal to pipeline startup; there is no automatic retry.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    /// Name of the selected device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}

/// Accumulates raw callback buffers into fixed-size frames and pushes them to
/// the bounded queue with the drop-oldest overflow policy.
pub(super) struct FrameChunker {
    frame_samples: usize,
    channels: u16,
    sample_rate: u32,
    pending: Vec<f32>,
    sender: Sender<AudioFrame>,
    /// Receiver clone used only to evict the oldest frame on overflow.
    evict_rx: Receiver<AudioFrame>,
    evicted: Arc<AtomicUsize>,
}

impl FrameChunker {
    pub(super) fn new(
        frame_samples: usize,
        channels: u16,
        sample_rate: u32,
        sender: Sender<AudioFrame>,
        evict_rx: Receiver<AudioFrame>,
        evicted: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            frame_samples: frame_samples.max(1),
            channels,
            sample_rate,
            pending: Vec::with_capacity(frame_samples),
            sender,
            evict_rx,
            evicted,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], mut convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.pending.extend(data.iter().copied().map(&mut convert));

        while self.pending.len() >= self.frame_samples {
            let samples: Vec<f32> = self.pending.drain(..self.frame_samples).collect();
            let frame = AudioFrame::new(samples, self.channels, self.sample_rate);
            match self.sender.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full(frame)) => {
                    // Make room by discarding the oldest unread frame, then
                    // insert the new one so the queue keeps the freshest audio.
                    if self.evict_rx.try_recv().is_ok() {
                        self.evicted.fetch_add(1, Ordering::Relaxed);
                    }
                    let _ = self.sender.try_send(frame);
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    }
}

/// Live capture stream delivering fixed-size [`AudioFrame`]s.
///
/// Owns the CPAL stream, so it must be opened and used on the processing
/// thread; cross-thread shutdown goes through the shared cancel flag.
pub struct FrameSource {
    stream: Option<cpal::Stream>,
    receiver: Receiver<AudioFrame>,
    cancel: Arc<AtomicBool>,
    poll_interval: Duration,
    evicted: Arc<AtomicUsize>,
    callback_misses: Arc<AtomicUsize>,
}

impl FrameSource {
    /// Build and start the capture stream.
    ///
    /// The device is asked for exactly the configured sample rate and channel
    /// count; an unsupported combination surfaces as a stream-build error,
    /// which callers treat as fatal.
    pub fn open(
        device: &InputDevice,
        cfg: &SourceConfig,
        cancel: Arc<AtomicBool>,
        evicted: Arc<AtomicUsize>,
    ) -> Result<Self> {
        let default_config = device
            .device
            .default_input_config()
            .with_context(|| format!("failed to query '{}'", device.device_name()))?;
        let format = default_config.sample_format();
        let stream_config = StreamConfig {
            channels: cfg.channels.max(1),
            sample_rate: SampleRate(cfg.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (sender, receiver) = bounded::<AudioFrame>(cfg.queue_capacity());
        let chunker = Arc::new(Mutex::new(FrameChunker::new(
            cfg.interleaved_frame_samples(),
            cfg.channels,
            cfg.sample_rate,
            sender,
            receiver.clone(),
            evicted.clone(),
        )));
        let callback_misses = Arc::new(AtomicUsize::new(0));

        log_debug(&format!(
            "FrameSource config: device={} format={format:?} sample_rate={}Hz channels={} frame_len={} queue={}",
            device.device_name(),
            cfg.sample_rate,
            cfg.channels,
            cfg.frame_len,
            cfg.queue_capacity()
        ));

        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));
        let stream = match format {
            SampleFormat::F32 => {
                let chunker = chunker.clone();
                let misses = callback_misses.clone();
                device.device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = chunker.try_lock() {
                            pump.push(data, |sample| sample);
                        } else {
                            misses.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let chunker = chunker.clone();
                let misses = callback_misses.clone();
                device.device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = chunker.try_lock() {
                            pump.push(data, |sample| sample as f32 / 32_768.0);
                        } else {
                            misses.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let chunker = chunker.clone();
                let misses = callback_misses.clone();
                device.device.build_input_stream(
                    &stream_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = chunker.try_lock() {
                            pump.push(data, |sample| (sample as f32 - 32_768.0) / 32_768.0);
                        } else {
                            misses.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => {
                return Err(anyhow!(
                    "unsupported sample format: {other:?}. {}",
                    mic_permission_hint()
                ))
            }
        };

        stream.play().context("failed to start capture stream")?;

        Ok(Self {
            stream: Some(stream),
            receiver,
            cancel,
            poll_interval: cfg.frame_duration().clamp(
                Duration::from_millis(1),
                Duration::from_millis(120),
            ),
            evicted,
            callback_misses,
        })
    }

    /// Block until the next frame arrives, the cancel flag is raised, or the
    /// stream goes away. Returns `None` once the source is stopped.
    pub fn read_next_frame(&self) -> Option<AudioFrame> {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return None;
            }
            match self.receiver.recv_timeout(self.poll_interval) {
                Ok(frame) => return Some(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Oldest-frame evictions since the stream started.
    pub fn frames_evicted(&self) -> usize {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Callback invocations that found the chunker busy and dropped their data.
    pub fn callback_misses(&self) -> usize {
        self.callback_misses.load(Ordering::Relaxed)
    }

    /// Halt the device and release hardware resources. Safe to call more than
    /// once.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log_debug(&format!("failed to pause audio stream: {err}"));
            }
            drop(stream);
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
