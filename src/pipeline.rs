//! Pipeline orchestration: capture, segmentation, and clip dispatch.
//!
//! `start()` launches two worker threads. The frame pump owns the capture
//! stream and the segmenter: it reads frames in capture order, feeds the
//! segmenter, and encodes finished clips. The dispatch loop drains a queue of
//! encoded clips and notifies listeners, so slow consumers never sit on the
//! capture-to-segmentation path. `stop()` signals both loops, waits for them,
//! and flushes an in-flight clip before returning.

use crate::audio::{
    ClipBoundary, ClipEncoder, ClipSegmenter, EncodedClip, FrameSource, InputDevice, LiveMeter,
    SegmenterConfig, SourceConfig,
};
use crate::config::PipelineConfig;
use crate::dispatch::{ClipDispatcher, ClipListener};
use crate::log_debug;
use anyhow::{anyhow, bail, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tracing::{info, warn};

/// Lifecycle phase of the pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Stopped,
    Running,
}

/// Counters collected across a pipeline run for observability.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineMetrics {
    pub frames_processed: usize,
    /// Oldest frames evicted from the capture queue under backpressure. Loss
    /// is observable here, never raised as an error.
    pub frames_evicted: usize,
    pub clips_saved: usize,
    pub clips_discarded: usize,
    pub encode_failures: usize,
    pub listener_failures: usize,
}

#[derive(Default)]
struct PipelineCounters {
    frames_processed: AtomicUsize,
    clips_saved: AtomicUsize,
    clips_discarded: AtomicUsize,
    encode_failures: AtomicUsize,
    listener_failures: AtomicUsize,
}

/// Owns the capture and dispatch workers for its lifetime. No audio data
/// lives here; frames and clip buffers stay inside the pump thread.
pub struct Pipeline {
    config: PipelineConfig,
    dispatcher: Arc<Mutex<ClipDispatcher>>,
    counters: Arc<PipelineCounters>,
    evicted: Arc<AtomicUsize>,
    meter: LiveMeter,
    stop_flag: Arc<AtomicBool>,
    pump: Option<thread::JoinHandle<()>>,
    dispatch: Option<thread::JoinHandle<()>>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            dispatcher: Arc::new(Mutex::new(ClipDispatcher::new())),
            counters: Arc::new(PipelineCounters::default()),
            evicted: Arc::new(AtomicUsize::new(0)),
            meter: LiveMeter::new(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            pump: None,
            dispatch: None,
            state: PipelineState::Stopped,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Live input level handle for UI polling.
    pub fn meter(&self) -> LiveMeter {
        self.meter.clone()
    }

    pub fn metrics(&self) -> PipelineMetrics {
        PipelineMetrics {
            frames_processed: self.counters.frames_processed.load(Ordering::Relaxed),
            frames_evicted: self.evicted.load(Ordering::Relaxed),
            clips_saved: self.counters.clips_saved.load(Ordering::Relaxed),
            clips_discarded: self.counters.clips_discarded.load(Ordering::Relaxed),
            encode_failures: self.counters.encode_failures.load(Ordering::Relaxed),
            listener_failures: self.counters.listener_failures.load(Ordering::Relaxed),
        }
    }

    /// Register a clip listener. Usable before or while running.
    pub fn subscribe(&self, listener: Arc<dyn ClipListener>) {
        self.dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .subscribe(listener);
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn ClipListener>) {
        self.dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .unsubscribe(listener);
    }

    /// Start capturing. Fails if already running, if the input device cannot
    /// be opened, or if the output directory cannot be created; those are the
    /// only failures that prevent startup.
    pub fn start(&mut self) -> Result<()> {
        if self.state == PipelineState::Running {
            bail!("pipeline already running");
        }

        let encoder = ClipEncoder::create(&self.config.out_dir)?;
        let device = InputDevice::new(self.config.input_device.as_deref())?;
        let device_name = device.device_name();

        self.stop_flag.store(false, Ordering::Relaxed);
        let (clip_tx, clip_rx) = unbounded::<EncodedClip>();
        // One-shot handshake so stream-open failures surface from start().
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        let source_cfg = SourceConfig {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            frame_len: self.config.frame_len,
            max_retained_secs: self.config.max_retained_secs,
        };
        let seg_cfg = SegmenterConfig {
            threshold: self.config.threshold,
            margin_secs: self.config.margin_secs,
            min_clip_secs: self.config.min_clip_secs,
        };

        let stop_flag = self.stop_flag.clone();
        let counters = self.counters.clone();
        let evicted = self.evicted.clone();
        let meter = self.meter.clone();
        let pump = thread::spawn(move || {
            run_frame_pump(
                device, source_cfg, seg_cfg, encoder, clip_tx, ready_tx, stop_flag, counters,
                evicted, meter,
            );
        });

        let dispatcher = self.dispatcher.clone();
        let counters = self.counters.clone();
        let dispatch = thread::spawn(move || {
            run_clip_dispatch(clip_rx, dispatcher, counters);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                // The pump already exited; its clip sender is gone, so the
                // dispatch loop drains and exits too.
                let _ = pump.join();
                let _ = dispatch.join();
                return Err(err);
            }
            Err(_) => {
                let _ = pump.join();
                let _ = dispatch.join();
                bail!("capture thread exited before reporting startup status");
            }
        }

        info!(device = %device_name, "pipeline started");
        self.pump = Some(pump);
        self.dispatch = Some(dispatch);
        self.state = PipelineState::Running;
        Ok(())
    }

    /// Stop capturing. Safe to call from any thread and safe to call again
    /// after the pipeline stopped; an open clip that satisfies the minimum
    /// duration is encoded and dispatched before this returns.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PipelineState::Stopped {
            return Ok(());
        }
        self.stop_flag.store(true, Ordering::Relaxed);

        // Join order matters: the pump flushes its open clip and drops the
        // clip sender, which lets the dispatch loop drain and terminate.
        if let Some(pump) = self.pump.take() {
            pump.join()
                .map_err(|_| anyhow!("frame pump thread panicked"))?;
        }
        if let Some(dispatch) = self.dispatch.take() {
            dispatch
                .join()
                .map_err(|_| anyhow!("clip dispatch thread panicked"))?;
        }

        self.state = PipelineState::Stopped;
        info!("pipeline stopped");
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
fn run_frame_pump(
    device: InputDevice,
    source_cfg: SourceConfig,
    seg_cfg: SegmenterConfig,
    encoder: ClipEncoder,
    clip_tx: Sender<EncodedClip>,
    ready_tx: mpsc::SyncSender<Result<()>>,
    stop_flag: Arc<AtomicBool>,
    counters: Arc<PipelineCounters>,
    evicted: Arc<AtomicUsize>,
    meter: LiveMeter,
) {
    let mut source = match FrameSource::open(&device, &source_cfg, stop_flag.clone(), evicted) {
        Ok(source) => {
            let _ = ready_tx.send(Ok(()));
            source
        }
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    let sample_rate = source_cfg.sample_rate;
    let channels = source_cfg.channels;
    let mut segmenter = ClipSegmenter::new(seg_cfg);

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }
        let Some(frame) = source.read_next_frame() else {
            break;
        };
        counters.frames_processed.fetch_add(1, Ordering::Relaxed);
        meter.set_level(frame.rms());
        if let Some(boundary) = segmenter.process(frame) {
            handle_boundary(boundary, &encoder, sample_rate, channels, &clip_tx, &counters);
        }
    }

    // Shutdown flush: an open clip is closed (margin tail trimmed) and, if it
    // meets the minimum duration, dispatched before the pump exits.
    if let Some(boundary) = segmenter.flush() {
        handle_boundary(boundary, &encoder, sample_rate, channels, &clip_tx, &counters);
    }
    source.stop();
    meter.set_level(0.0);
}

fn handle_boundary(
    boundary: ClipBoundary,
    encoder: &ClipEncoder,
    sample_rate: u32,
    channels: u16,
    clip_tx: &Sender<EncodedClip>,
    counters: &PipelineCounters,
) {
    match boundary {
        ClipBoundary::Ready(buffer) => match encoder.encode(&buffer, sample_rate, channels) {
            Ok(clip) => {
                counters.clips_saved.fetch_add(1, Ordering::Relaxed);
                log_debug(&format!(
                    "clip_saved|path={}|duration_s={:.2}",
                    clip.path.display(),
                    clip.duration_secs
                ));
                let _ = clip_tx.send(clip);
            }
            Err(err) => {
                // Clip loss is non-fatal: report it and keep capturing.
                counters.encode_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %format!("{err:#}"), "failed to encode clip");
                log_debug(&format!("clip_encode_error|error={err:#}"));
            }
        },
        ClipBoundary::Discarded { duration_secs } => {
            counters.clips_discarded.fetch_add(1, Ordering::Relaxed);
            log_debug(&format!(
                "clip_discarded|duration_s={duration_secs:.2}|reason=below_min_duration"
            ));
        }
    }
}

fn run_clip_dispatch(
    clip_rx: Receiver<EncodedClip>,
    dispatcher: Arc<Mutex<ClipDispatcher>>,
    counters: Arc<PipelineCounters>,
) {
    // Terminates when the pump drops its sender: the channel drains first, so
    // clips finalized during shutdown are still delivered in close order.
    while let Ok(clip) = clip_rx.recv() {
        let failures = dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .publish(&clip.path);
        if failures > 0 {
            counters
                .listener_failures
                .fetch_add(failures, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use std::path::PathBuf;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            input_device: None,
            sample_rate: 44_100,
            channels: 1,
            frame_len: 1024,
            threshold: 0.01,
            margin_secs: 0.5,
            min_clip_secs: 1.0,
            max_retained_secs: 60,
            out_dir: std::env::temp_dir().join("voiceclip_pipeline_tests"),
        }
    }

    #[test]
    fn new_pipeline_starts_stopped_with_zero_metrics() {
        let pipeline = Pipeline::new(test_config());
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(pipeline.metrics(), PipelineMetrics::default());
    }

    #[test]
    fn stop_before_start_is_noop() {
        let mut pipeline = Pipeline::new(test_config());
        pipeline.stop().expect("stop on a stopped pipeline is safe");
        pipeline.stop().expect("stop stays safe on repeat calls");
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }

    #[test]
    fn start_with_unknown_device_fails_and_stays_stopped() {
        let mut config = test_config();
        config.input_device = Some("no-such-device-voiceclip".to_string());
        let mut pipeline = Pipeline::new(config);
        // Either the named device is missing or the host has no inputs at
        // all; both are fatal device-open errors.
        let err = pipeline.start().expect_err("bogus device must not start");
        let text = format!("{err:#}");
        assert!(
            text.contains("no-such-device-voiceclip") || text.contains("input devices"),
            "unexpected error: {text}"
        );
        assert_eq!(pipeline.state(), PipelineState::Stopped);
    }

    #[test]
    fn start_with_unwritable_out_dir_fails() {
        // A file where the clip directory should be makes create_dir_all fail.
        let blocker = std::env::temp_dir().join("voiceclip_out_dir_blocker");
        std::fs::write(&blocker, b"not a directory").expect("write blocker file");

        let mut config = test_config();
        config.out_dir = PathBuf::from(&blocker);
        let mut pipeline = Pipeline::new(config);
        let err = pipeline.start().expect_err("file as out dir must not start");
        assert!(format!("{err:#}").contains("clip directory"));
        assert_eq!(pipeline.state(), PipelineState::Stopped);

        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn subscribe_registers_listener_before_start() {
        use crate::dispatch::ClipListener;
        use std::path::Path;

        struct Nop;
        impl ClipListener for Nop {
            fn on_clip_ready(&self, _path: &Path) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let pipeline = Pipeline::new(test_config());
        let listener: Arc<dyn ClipListener> = Arc::new(Nop);
        pipeline.subscribe(listener.clone());
        pipeline.subscribe(listener.clone());
        pipeline.unsubscribe(&listener);
        // Dedupe plus unsubscribe leaves an empty registry.
        assert!(pipeline
            .dispatcher
            .lock()
            .expect("dispatcher lock")
            .is_empty());
    }
}
