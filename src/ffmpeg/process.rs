//! Encoder process supervision.
//!
//! Isolates the platform process APIs behind one seam: spawning, a bounded
//! start confirmation, the stop-command channel, the cooperative-terminate and
//! force-kill escalation tiers, and exit observation. The child handle is
//! shared behind a mutex so the controller's stop ladder and the watcher
//! thread can both poll it; `try_wait` caches the exit status after reaping,
//! so repeated observation is safe.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::constants::EXIT_POLL_INTERVAL_MS;
use crate::devices::decode::decode_console_bytes;
use crate::events::RecorderEvents;

#[derive(Clone)]
pub struct EncoderProcess {
    child: Arc<Mutex<Child>>,
    pid: u32,
}

impl EncoderProcess {
    /// Spawns the encoder with stdin piped for the stop command and stderr
    /// relayed line-by-line to the event sink.
    pub fn spawn(
        exe: &Path,
        args: &[String],
        events: Arc<dyn RecorderEvents>,
    ) -> std::io::Result<Self> {
        let mut child = Command::new(exe)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        let pid = child.id();

        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                let mut reader = BufReader::new(stderr);
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            let line = decode_console_bytes(&buf);
                            let line = line.trim_end();
                            if !line.is_empty() {
                                events.on_log(line);
                            }
                        }
                    }
                }
            });
        }

        Ok(Self { child: Arc::new(Mutex::new(child)), pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Bounded check that the process did not die right after spawn. Returns
    /// the exit code when it already finished inside the window.
    pub fn confirm_started(&self, window: Duration) -> Result<Option<i32>, String> {
        let deadline = Instant::now() + window;
        loop {
            match self.poll_exit() {
                Some(code) if code == crate::constants::ENCODER_SUCCESS_EXIT => {
                    return Ok(Some(code));
                }
                Some(code) => {
                    return Err(format!("encoder exited immediately with code {code}"));
                }
                None => {}
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(EXIT_POLL_INTERVAL_MS));
        }
    }

    /// Writes the graceful-stop command (`q`) to the encoder's stdin.
    pub fn request_stop(&self) -> Result<(), String> {
        let mut guard = self.child.lock().map_err(|e| e.to_string())?;
        match guard.stdin.as_mut() {
            Some(stdin) => stdin
                .write_all(b"q\n")
                .and_then(|_| stdin.flush())
                .map_err(|e| e.to_string()),
            None => Err("stdin already closed".to_string()),
        }
    }

    /// Non-blocking exit check.
    pub fn poll_exit(&self) -> Option<i32> {
        let mut guard = self.child.lock().ok()?;
        match guard.try_wait() {
            Ok(Some(status)) => Some(status.code().unwrap_or(-1)),
            Ok(None) => None,
            Err(err) => {
                warn!("try_wait failed for pid {}: {err}", self.pid);
                None
            }
        }
    }

    /// Polls for exit until the timeout elapses.
    pub fn wait_exit(&self, timeout: Duration) -> Option<i32> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(code) = self.poll_exit() {
                return Some(code);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(EXIT_POLL_INTERVAL_MS));
        }
    }

    /// Blocks until the process exits; used by the watcher thread.
    pub fn wait_exit_blocking(&self) -> i32 {
        loop {
            if let Some(code) = self.wait_exit(Duration::from_secs(1)) {
                return code;
            }
        }
    }

    /// Cooperative terminate tier: SIGTERM on Unix, a non-forced `taskkill`
    /// on Windows.
    pub fn terminate(&self) {
        debug!("terminating encoder pid {}", self.pid);
        #[cfg(unix)]
        unsafe {
            libc::kill(self.pid as libc::pid_t, libc::SIGTERM);
        }
        #[cfg(windows)]
        {
            let _ = Command::new("taskkill")
                .args(["/PID", &self.pid.to_string()])
                .output();
        }
    }

    /// Force-kill tier.
    pub fn kill(&self) {
        warn!("force-killing encoder pid {}", self.pid);
        if let Ok(mut guard) = self.child.lock() {
            let _ = guard.kill();
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::events::NullEvents;
    use std::path::PathBuf;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn null_events() -> Arc<dyn RecorderEvents> {
        Arc::new(NullEvents)
    }

    #[test]
    fn test_short_process_reports_exit() {
        let process =
            EncoderProcess::spawn(&sh(), &["-c".into(), "exit 0".into()], null_events()).unwrap();
        assert_eq!(process.wait_exit(Duration::from_secs(5)), Some(0));
        // Exit status stays observable after reaping.
        assert_eq!(process.poll_exit(), Some(0));
    }

    #[test]
    fn test_confirm_started_catches_immediate_failure() {
        let process =
            EncoderProcess::spawn(&sh(), &["-c".into(), "exit 3".into()], null_events()).unwrap();
        let result = process.confirm_started(Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[test]
    fn test_confirm_started_for_running_process() {
        let process =
            EncoderProcess::spawn(&sh(), &["-c".into(), "sleep 5".into()], null_events()).unwrap();
        let confirmed = process.confirm_started(Duration::from_millis(200));
        assert_eq!(confirmed, Ok(None));
        process.kill();
        assert!(process.wait_exit(Duration::from_secs(5)).is_some());
    }

    #[test]
    fn test_stop_command_reaches_stdin() {
        // `head -n1` exits once it reads the line written by request_stop.
        let process =
            EncoderProcess::spawn(&sh(), &["-c".into(), "head -n1 >/dev/null".into()], null_events())
                .unwrap();
        process.request_stop().unwrap();
        assert_eq!(process.wait_exit(Duration::from_secs(5)), Some(0));
    }

    #[test]
    fn test_terminate_tier() {
        let process =
            EncoderProcess::spawn(&sh(), &["-c".into(), "sleep 30".into()], null_events()).unwrap();
        process.terminate();
        assert!(process.wait_exit(Duration::from_secs(5)).is_some());
    }
}
