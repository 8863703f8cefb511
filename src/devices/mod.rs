//! Audio capture device discovery.
//!
//! # Architecture
//!
//! * `probe`: Runs the capture tool with `-list_devices` and collects its stderr.
//! * `decode`: Best-effort decoding of the probe output, whose encoding depends
//!   on the system locale.
//! * `parser`: Turns the decoded text into a de-duplicated device catalog.
//! * `select`: Heuristic virtual-device picking, name lookup, and input
//!   argument resolution.

pub mod decode;
pub mod parser;
pub mod probe;
pub mod select;

pub use parser::DeviceDescriptor;
pub use probe::list_audio_devices;
pub use select::{device_input_arg, find_by_name, pick_virtual_audio};
