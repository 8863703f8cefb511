//! Segmented recording via an external FFmpeg-style encoder.
//!
//! # Architecture
//!
//! * `controller`: The recording state machine. Owns the session, drives
//!   pause/resume by closing and respawning segment processes.
//! * `session`: Segment and session bookkeeping.
//! * `command`: Pure construction of the encoder argument list.
//! * `encoder`: Video codec selection (software preset vs fixed hardware
//!   presets).
//! * `process`: Child-process supervision, stop escalation, exit observation.
//! * `merge`: Finalization by rename or stream-copy concatenation.

pub mod command;
pub mod controller;
pub mod encoder;
pub mod merge;
pub mod process;
pub mod session;
