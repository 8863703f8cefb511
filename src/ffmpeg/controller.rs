//! Recording state machine.
//!
//! Owns the session and the active encoder process. One segment process runs
//! at a time; pause asks the encoder to finish its file cleanly and resume
//! spawns the next segment. All transitions happen under a single mutex,
//! either synchronously inside a caller action or inside the watcher thread's
//! completion notification, so they never interleave.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::constants::{
    ENCODER_SUCCESS_EXIT, GRACEFUL_STOP_TIMEOUT_MS, KILL_WAIT_TIMEOUT_MS,
    START_CONFIRM_WINDOW_MS, TERMINATE_TIMEOUT_MS,
};
use crate::devices::probe::resolve_executable;
use crate::error::{RecorderError, Result};
use crate::events::RecorderEvents;
use crate::ffmpeg::command::{build_args, RecordingOptions};
use crate::ffmpeg::merge;
use crate::ffmpeg::process::EncoderProcess;
use crate::ffmpeg::session::{RecordingSession, SegmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Running,
    /// Graceful stop sent to the current segment; waiting for it to exit.
    Closing,
    Paused,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecorderState::Idle => "idle",
            RecorderState::Running => "running",
            RecorderState::Closing => "closing",
            RecorderState::Paused => "paused",
        };
        f.write_str(name)
    }
}

struct ActiveSegment {
    process: EncoderProcess,
    sequence: u32,
}

struct ControllerInner {
    state: RecorderState,
    options: Option<RecordingOptions>,
    session: Option<RecordingSession>,
    active: Option<ActiveSegment>,
    /// Resume arrived while the previous segment was still closing.
    resume_pending: bool,
    /// Swallow the next "segment saved" log line (set by pause).
    suppress_segment_log: bool,
}

pub struct RecordingController {
    inner: Arc<Mutex<ControllerInner>>,
    events: Arc<dyn RecorderEvents>,
}

impl RecordingController {
    pub fn new(events: Arc<dyn RecorderEvents>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControllerInner {
                state: RecorderState::Idle,
                options: None,
                session: None,
                active: None,
                resume_pending: false,
                suppress_segment_log: false,
            })),
            events,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.inner.lock().map(|g| g.state).unwrap_or(RecorderState::Idle)
    }

    /// Creates a session and spawns the first segment.
    pub fn start(&self, options: RecordingOptions) -> Result<()> {
        let mut guard = lock(&self.inner)?;
        if guard.state != RecorderState::Idle {
            return Err(self.report(RecorderError::State("recording already active".into())));
        }

        resolve_executable(&options.ffmpeg_path)
            .ok_or_else(|| self.report(RecorderError::ToolNotFound(options.ffmpeg_path.clone())))?;

        let session = RecordingSession::create(&options.output_dir)
            .map_err(|e| self.report(e))?;
        info!("session {} -> {}", session.base_timestamp, session.final_output_path.display());
        guard.session = Some(session);
        guard.options = Some(options);
        guard.resume_pending = false;
        guard.suppress_segment_log = false;

        if let Err(err) = spawn_next_segment(&mut guard, &self.inner, &self.events) {
            // Roll back so a failed start leaves no half-open session behind.
            if let Some(session) = guard.session.take() {
                let _ = std::fs::remove_dir_all(&session.segment_dir);
            }
            guard.options = None;
            return Err(self.report(err));
        }

        set_state(&mut guard, &self.events, RecorderState::Running);
        self.events.on_started();
        Ok(())
    }

    /// Asks the current segment to finish cleanly; the watcher moves the
    /// state to `Paused` once it exits.
    pub fn pause(&self) -> Result<()> {
        let mut guard = lock(&self.inner)?;
        match guard.state {
            RecorderState::Running => {
                if let Some(active) = &guard.active {
                    if let Err(err) = active.process.request_stop() {
                        warn!("graceful stop write failed: {err}");
                    }
                }
                guard.suppress_segment_log = true;
                set_state(&mut guard, &self.events, RecorderState::Closing);
                Ok(())
            }
            // Already stopping; nothing more to do.
            RecorderState::Closing => Ok(()),
            RecorderState::Idle | RecorderState::Paused => {
                Err(self.report(RecorderError::State("nothing running to pause".into())))
            }
        }
    }

    /// Spawns the next segment, or defers until the closing segment exits.
    pub fn resume(&self) -> Result<()> {
        let mut guard = lock(&self.inner)?;
        match guard.state {
            RecorderState::Paused => {
                spawn_next_segment(&mut guard, &self.inner, &self.events)
                    .map_err(|e| self.report(e))?;
                set_state(&mut guard, &self.events, RecorderState::Running);
                Ok(())
            }
            RecorderState::Closing => {
                guard.resume_pending = true;
                Ok(())
            }
            RecorderState::Running => Ok(()),
            RecorderState::Idle => {
                if guard.session.is_some() {
                    spawn_next_segment(&mut guard, &self.inner, &self.events)
                        .map_err(|e| self.report(e))?;
                    set_state(&mut guard, &self.events, RecorderState::Running);
                    Ok(())
                } else {
                    Err(self.report(RecorderError::State("no session to resume".into())))
                }
            }
        }
    }

    /// Stops the active segment (graceful, then terminate, then kill) and
    /// finalizes the session. Returns the final output path.
    pub fn stop(&self) -> Result<PathBuf> {
        let mut guard = lock(&self.inner)?;
        match guard.state {
            RecorderState::Idle => {
                Err(self.report(RecorderError::State("no active recording".into())))
            }
            RecorderState::Running | RecorderState::Closing => {
                guard.resume_pending = false;
                if let Some(active) = guard.active.take() {
                    let code = stop_with_escalation(&active.process);
                    evaluate_segment(&mut guard, &self.events, active.sequence, code);
                }
                self.finalize(&mut guard)
            }
            RecorderState::Paused => {
                guard.resume_pending = false;
                self.finalize(&mut guard)
            }
        }
    }

    fn finalize(
        &self,
        guard: &mut std::sync::MutexGuard<'_, ControllerInner>,
    ) -> Result<PathBuf> {
        let session = guard
            .session
            .take()
            .ok_or_else(|| RecorderError::State("no session to finalize".into()))?;
        let ffmpeg_path = guard
            .options
            .take()
            .map(|o| o.ffmpeg_path)
            .unwrap_or_default();
        set_state(guard, &self.events, RecorderState::Idle);

        match merge::finalize(&session, &ffmpeg_path) {
            Ok(path) => {
                info!("recording saved to {}", path.display());
                self.events.on_stopped(0);
                Ok(path)
            }
            Err(err) => Err(self.report(err)),
        }
    }

    fn report(&self, err: RecorderError) -> RecorderError {
        warn!("{err}");
        self.events.on_error(&err);
        err
    }
}

fn lock(
    inner: &Arc<Mutex<ControllerInner>>,
) -> Result<std::sync::MutexGuard<'_, ControllerInner>> {
    inner
        .lock()
        .map_err(|_| RecorderError::State("controller lock poisoned".into()))
}

fn set_state(
    guard: &mut std::sync::MutexGuard<'_, ControllerInner>,
    events: &Arc<dyn RecorderEvents>,
    state: RecorderState,
) {
    if guard.state != state {
        guard.state = state;
        events.on_state_changed(state);
    }
}

/// Spawns the next segment process and its watcher. Caller sets the state.
fn spawn_next_segment(
    guard: &mut std::sync::MutexGuard<'_, ControllerInner>,
    inner: &Arc<Mutex<ControllerInner>>,
    events: &Arc<dyn RecorderEvents>,
) -> Result<()> {
    let options = guard
        .options
        .clone()
        .ok_or_else(|| RecorderError::State("no recording options".into()))?;
    let exe = resolve_executable(&options.ffmpeg_path)
        .ok_or_else(|| RecorderError::ToolNotFound(options.ffmpeg_path.clone()))?;

    let session = guard
        .session
        .as_mut()
        .ok_or_else(|| RecorderError::State("no session".into()))?;
    let (sequence, path) = session.begin_segment();
    let args = build_args(&options, &path);
    events.on_log(&format!("spawning encoder: {} {}", exe.display(), args.join(" ")));

    let process = match EncoderProcess::spawn(&exe, &args, Arc::clone(events)) {
        Ok(process) => process,
        Err(err) => {
            session.finish_segment(sequence, SegmentStatus::Failed);
            return Err(RecorderError::ProcessStartFailed(err.to_string()));
        }
    };

    if let Err(reason) = process.confirm_started(Duration::from_millis(START_CONFIRM_WINDOW_MS)) {
        session.finish_segment(sequence, SegmentStatus::Failed);
        return Err(RecorderError::ProcessStartFailed(reason));
    }

    guard.active = Some(ActiveSegment { process: process.clone(), sequence });

    let inner = Arc::clone(inner);
    let events = Arc::clone(events);
    thread::spawn(move || {
        let code = process.wait_exit_blocking();
        handle_segment_exit(&inner, &events, sequence, code);
    });
    Ok(())
}

/// Watcher-thread entry: evaluates the finished segment and advances the
/// state machine. A segment already evaluated by a synchronous stop is left
/// alone.
fn handle_segment_exit(
    inner: &Arc<Mutex<ControllerInner>>,
    events: &Arc<dyn RecorderEvents>,
    sequence: u32,
    code: i32,
) {
    let Ok(mut guard) = inner.lock() else {
        return;
    };
    if guard.session.is_none() {
        return;
    }

    if !evaluate_segment(&mut guard, events, sequence, Some(code)) {
        // Stale notification for a segment stop() already settled.
        return;
    }
    guard.active = None;

    match guard.state {
        RecorderState::Running | RecorderState::Closing => {
            if guard.resume_pending {
                guard.resume_pending = false;
                match spawn_next_segment(&mut guard, inner, events) {
                    Ok(()) => set_state(&mut guard, events, RecorderState::Running),
                    Err(err) => {
                        warn!("{err}");
                        events.on_error(&err);
                        set_state(&mut guard, events, RecorderState::Paused);
                    }
                }
            } else {
                set_state(&mut guard, events, RecorderState::Paused);
            }
        }
        RecorderState::Idle | RecorderState::Paused => {}
    }
}

/// Marks the segment completed or failed. A segment counts only when the
/// process exited with the success code and its file exists with nonzero
/// size; otherwise it is dropped and the session continues. Returns `false`
/// for segments that were already settled.
fn evaluate_segment(
    guard: &mut std::sync::MutexGuard<'_, ControllerInner>,
    events: &Arc<dyn RecorderEvents>,
    sequence: u32,
    code: Option<i32>,
) -> bool {
    let suppress = std::mem::take(&mut guard.suppress_segment_log);
    let Some(session) = guard.session.as_mut() else {
        return false;
    };
    let Some(segment) = session.segments.iter().find(|s| s.sequence_index == sequence) else {
        return false;
    };
    if segment.status != SegmentStatus::Pending {
        return false;
    }
    let path = segment.path.clone();

    let file_ok = std::fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
    let usable = code == Some(ENCODER_SUCCESS_EXIT) && file_ok;

    if usable {
        session.finish_segment(sequence, SegmentStatus::Completed);
        if !suppress {
            events.on_log(&format!("segment {sequence} saved: {}", path.display()));
        }
    } else {
        session.finish_segment(sequence, SegmentStatus::Failed);
        let reason = match (code, file_ok) {
            (Some(c), _) if c != ENCODER_SUCCESS_EXIT => format!("encoder exit code {c}"),
            (None, _) => "encoder did not exit in time".to_string(),
            (_, false) => "output file missing or empty".to_string(),
            _ => "unknown".to_string(),
        };
        let err = RecorderError::SegmentFailed(sequence, reason);
        warn!("{err}, segment skipped");
        events.on_error(&err);
    }
    true
}

/// Three-tier stop ladder: `q` on stdin, then cooperative terminate, then
/// force kill. Bounds worst-case shutdown latency while preferring clean
/// encoder finalization.
fn stop_with_escalation(process: &EncoderProcess) -> Option<i32> {
    if let Err(err) = process.request_stop() {
        warn!("graceful stop write failed: {err}");
    }
    if let Some(code) = process.wait_exit(Duration::from_millis(GRACEFUL_STOP_TIMEOUT_MS)) {
        return Some(code);
    }

    warn!("encoder ignored graceful stop, terminating");
    process.terminate();
    if let Some(code) = process.wait_exit(Duration::from_millis(TERMINATE_TIMEOUT_MS)) {
        return Some(code);
    }

    process.kill();
    process.wait_exit(Duration::from_millis(KILL_WAIT_TIMEOUT_MS))
}
