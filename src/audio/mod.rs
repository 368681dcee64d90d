//! Audio capture and clip segmentation.
//!
//! Captures fixed-size PCM frames from a CPAL input device, classifies them by
//! RMS energy, and cuts the stream into minimum-length clips that are written
//! as 16-bit WAV files. The capture callback never blocks; sustained
//! backpressure evicts the oldest buffered frame instead of stalling the
//! hardware stream.

mod encoder;
mod frame;
mod meter;
mod segmenter;
mod source;

pub use encoder::{parse_clip_name, ClipEncoder, ClipMetadata, EncodedClip};
pub use frame::AudioFrame;
pub use meter::LiveMeter;
pub use segmenter::{ClipBoundary, ClipBuffer, ClipSegmenter, SegmenterConfig, SegmenterState};
pub use source::{FrameSource, InputDevice, SourceConfig};
