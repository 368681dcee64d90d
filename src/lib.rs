pub mod audio;
pub mod config;
pub mod dispatch;
mod logging;
pub mod pipeline;
mod telemetry;

pub use logging::{crash_log_path, init_logging, log_debug, log_file_path, log_panic};
pub use pipeline::{Pipeline, PipelineMetrics, PipelineState};
pub use telemetry::init_tracing;
