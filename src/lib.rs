//! Segmented screen/audio recording over an external FFmpeg-style encoder.
//!
//! Pause/resume splits a logical recording into discrete segment files that
//! are losslessly joined on stop. Audio capture devices are discovered by
//! parsing the capture tool's diagnostic output, with heuristics to pick a
//! virtual/loopback device automatically.

pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod events;
pub mod ffmpeg;

pub use config::AppConfig;
pub use devices::DeviceDescriptor;
pub use error::{RecorderError, Result};
pub use events::{NullEvents, RecorderEvents};
pub use ffmpeg::command::{AudioMode, CaptureRegion, RecordingOptions, SyncFilter};
pub use ffmpeg::controller::{RecorderState, RecordingController};
pub use ffmpeg::encoder::VideoEncoder;
