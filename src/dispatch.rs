//! Clip-ready notification fan-out.
//!
//! Downstream consumers (transcription, persistence, UI) register a
//! [`ClipListener`] and are invoked in registration order whenever a clip file
//! lands on disk. A failing listener is logged and skipped so the remaining
//! listeners still run; nothing a listener does can crash the dispatch loop.

use crate::log_debug;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Capability invoked when a finished clip is ready on disk.
///
/// Listeners run synchronously on the dispatch thread; a slow listener delays
/// later notifications, so heavy consumers should hand the path off to their
/// own worker instead of doing the work inline.
pub trait ClipListener: Send + Sync {
    fn on_clip_ready(&self, path: &Path) -> Result<()>;

    fn name(&self) -> &'static str {
        "clip_listener"
    }
}

/// Ordered registry of clip listeners.
#[derive(Default)]
pub struct ClipDispatcher {
    listeners: Vec<Arc<dyn ClipListener>>,
}

impl ClipDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Adding the same listener twice is a no-op.
    pub fn subscribe(&mut self, listener: Arc<dyn ClipListener>) {
        if self
            .listeners
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &listener))
        {
            return;
        }
        self.listeners.push(listener);
    }

    /// Remove a previously registered listener. Unknown listeners are ignored.
    pub fn unsubscribe(&mut self, listener: &Arc<dyn ClipListener>) {
        self.listeners
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notify every listener, in registration order, that a clip is ready.
    ///
    /// Listener failures are isolated: each is reported and the remaining
    /// listeners still run. Returns the number of listeners that failed.
    pub fn publish(&self, path: &Path) -> usize {
        let mut failures = 0;
        for listener in &self.listeners {
            if let Err(err) = listener.on_clip_ready(path) {
                failures += 1;
                warn!(
                    listener = listener.name(),
                    clip = %path.display(),
                    error = %format!("{err:#}"),
                    "clip listener failed"
                );
                log_debug(&format!(
                    "clip_listener_error|listener={}|clip={}|error={err:#}",
                    listener.name(),
                    path.display()
                ));
            }
        }
        failures
    }
}
