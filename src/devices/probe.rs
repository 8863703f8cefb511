//! Capture tool invocation for device discovery.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};

use crate::constants::{CAPTURE_BACKEND, DEFAULT_FFMPEG};
use crate::devices::decode::decode_console_bytes;
use crate::devices::parser::{parse_device_list, DeviceDescriptor};

/// Resolves a configured executable to a concrete path: an existing path is
/// used as-is, anything else is searched for on `PATH`.
pub fn resolve_executable(configured: &str) -> Option<PathBuf> {
    let trimmed = configured.trim();
    if !trimmed.is_empty() && Path::new(trimmed).exists() {
        return Some(PathBuf::from(trimmed));
    }
    let name = if trimmed.is_empty() { DEFAULT_FFMPEG } else { trimmed };
    search_path(name)
}

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let with_ext = dir.join(format!("{name}.exe"));
            if with_ext.is_file() {
                return Some(with_ext);
            }
        }
    }
    None
}

/// Lists audio capture devices by running the probe tool.
///
/// A tool that cannot be located or fails to execute yields an empty catalog
/// with a diagnostic log line, never an error.
pub fn list_audio_devices(ffmpeg_path: &str) -> Vec<DeviceDescriptor> {
    let Some(exe) = resolve_executable(ffmpeg_path) else {
        warn!("capture tool not found for device listing: {ffmpeg_path:?}");
        return Vec::new();
    };
    debug!("listing devices via {}", exe.display());

    let output = match Command::new(&exe)
        .args(["-hide_banner", "-list_devices", "true", "-f", CAPTURE_BACKEND, "-i", "dummy"])
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            warn!("device listing failed to run: {err}");
            return Vec::new();
        }
    };

    // The device listing is diagnostic output and lands on stderr.
    let text = decode_console_bytes(&output.stderr);
    parse_device_list(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_yields_empty_catalog() {
        let devices = list_audio_devices("/nonexistent/path/to/nothing");
        assert!(devices.is_empty());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("ffmpeg-test");
        std::fs::write(&exe, b"").unwrap();
        let resolved = resolve_executable(exe.to_str().unwrap()).unwrap();
        assert_eq!(resolved, exe);
    }

    #[test]
    fn test_resolve_unknown_name() {
        assert!(resolve_executable("definitely-not-a-real-binary-name").is_none());
    }
}
