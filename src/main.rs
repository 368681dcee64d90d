//! VoiceClip entrypoint: continuous capture cut into minimum-length WAV clips.
//!
//! Runs the capture pipeline until interrupted (or for `--run-secs`), printing
//! a line on stdout for every saved clip so downstream tooling can pick the
//! file up. With `--json-records` each line is a JSON record carrying the
//! metadata recovered from the clip file name.

use anyhow::Result;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use voiceclip::audio::{parse_clip_name, InputDevice};
use voiceclip::config::AppConfig;
use voiceclip::dispatch::ClipListener;
use voiceclip::{init_logging, init_tracing, log_debug, log_panic, Pipeline};

/// Forwards clip-ready notifications to stdout, plain or as JSON records.
struct StdoutListener {
    json: bool,
}

impl ClipListener for StdoutListener {
    fn on_clip_ready(&self, path: &Path) -> Result<()> {
        if self.json {
            let record = match parse_clip_name(path) {
                Some(meta) => serde_json::json!({
                    "path": path,
                    "closed_at": meta.closed_at,
                    "started_at": meta.started_at(),
                    "duration_secs": meta.duration_secs,
                }),
                None => serde_json::json!({ "path": path }),
            };
            println!("{record}");
        } else {
            println!("clip saved: {}", path.display());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    std::panic::set_hook(Box::new(|info| log_panic(info)));

    if config.list_input_devices {
        list_input_devices();
        return Ok(());
    }

    let mut pipeline = Pipeline::new(config.pipeline_config());
    pipeline.subscribe(Arc::new(StdoutListener {
        json: config.json_records,
    }));
    pipeline.start()?;
    eprintln!(
        "Recording into '{}' (threshold {}, margin {}s, min clip {}s).",
        config.out_dir.display(),
        config.threshold,
        config.margin_secs,
        config.min_clip_secs
    );

    if config.run_secs > 0 {
        thread::sleep(Duration::from_secs(config.run_secs));
    } else {
        eprintln!("Press Enter to stop.");
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }

    pipeline.stop()?;
    let metrics = pipeline.metrics();
    eprintln!(
        "Done: {} clip(s) saved, {} discarded, {} frame(s) processed, {} evicted.",
        metrics.clips_saved,
        metrics.clips_discarded,
        metrics.frames_processed,
        metrics.frames_evicted
    );
    log_debug(&format!(
        "pipeline_metrics|frames_processed={}|frames_evicted={}|clips_saved={}|clips_discarded={}|encode_failures={}|listener_failures={}",
        metrics.frames_processed,
        metrics.frames_evicted,
        metrics.clips_saved,
        metrics.clips_discarded,
        metrics.encode_failures,
        metrics.listener_failures
    ));
    Ok(())
}

fn list_input_devices() {
    match InputDevice::list_devices() {
        Ok(names) if names.is_empty() => println!("No audio input devices detected."),
        Ok(names) => {
            println!("Detected audio input devices:");
            for name in names {
                println!("  {name}");
            }
        }
        Err(err) => println!("Failed to list audio input devices: {err:#}"),
    }
}
