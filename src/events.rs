//! Recorder event notifications.
//!
//! The controller reports progress through this trait instead of depending on
//! any UI layer. Callbacks run synchronously on the controller's control path
//! (the calling thread for start/pause/resume/stop, the watcher thread for
//! segment completion), so implementations must be cheap and must not call
//! back into the controller.

use crate::error::RecorderError;
use crate::ffmpeg::controller::RecorderState;

pub trait RecorderEvents: Send + Sync {
    /// First segment confirmed running.
    fn on_started(&self) {}

    /// Session finalized; `code` is the overall exit code (0 on success).
    fn on_stopped(&self, _code: i32) {}

    fn on_error(&self, _error: &RecorderError) {}

    /// Diagnostic text, including relayed encoder output.
    fn on_log(&self, _line: &str) {}

    fn on_state_changed(&self, _state: RecorderState) {}
}

/// Subscriber that discards every notification.
pub struct NullEvents;

impl RecorderEvents for NullEvents {}
