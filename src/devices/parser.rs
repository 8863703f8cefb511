//! Parses the capture tool's `-list_devices` diagnostic text into a device
//! catalog.
//!
//! The output is semi-structured and varies between tool versions: every line
//! may carry a bracketed diagnostic tag, the section headers may be missing
//! entirely, and a declaration's alternate name arrives on a follow-up line.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{AUDIO_SECTION_HEADER, VIDEO_SECTION_HEADER};

/// One capture device as reported by the probe tool.
///
/// Identity is the full `(display_name, alternate_name)` pair; either field
/// may be empty, but never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    /// Human-readable, locale-dependent name.
    pub display_name: String,
    /// Stable machine moniker, empty when the tool reported none.
    pub alternate_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Audio,
    Video,
}

// `"CABLE Output (VB-Audio Virtual Cable)" (audio)`
fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*"(?P<name>[^"]+)"\s+\((?P<kind>[^)]*)\)\s*$"#).unwrap())
}

// `Alternative name "@device_cm_{...}\wave_{...}"`
fn alternate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)^\s*Alternative name\s+"(?P<alt>[^"]+)"\s*$"#).unwrap())
}

/// Parses decoded diagnostic text into a de-duplicated audio device catalog,
/// preserving first-seen order.
pub fn parse_device_list(text: &str) -> Vec<DeviceDescriptor> {
    let mut devices: Vec<DeviceDescriptor> = Vec::new();
    let mut section = Section::None;
    let mut last_open: Option<usize> = None;

    for raw in text.lines() {
        let line = strip_diag_prefix(raw.trim_end_matches(['\r', '\n']));

        // Section headers are a secondary signal only; some tool versions
        // omit them.
        if line.contains(AUDIO_SECTION_HEADER) {
            section = Section::Audio;
            continue;
        }
        if line.contains(VIDEO_SECTION_HEADER) {
            section = Section::Video;
            continue;
        }

        if let Some(caps) = declaration_re().captures(line) {
            let kind = caps.name("kind").map(|m| m.as_str()).unwrap_or("");
            if is_audio_declaration(kind, line, section) {
                devices.push(DeviceDescriptor {
                    display_name: caps["name"].to_string(),
                    alternate_name: String::new(),
                });
                last_open = Some(devices.len() - 1);
            }
            continue;
        }

        if let Some(caps) = alternate_re().captures(line) {
            let alt = caps["alt"].to_string();
            match last_open {
                Some(idx) => devices[idx].alternate_name = alt,
                None => {
                    // Alternate name with no preceding declaration still
                    // identifies a usable device.
                    devices.push(DeviceDescriptor {
                        display_name: String::new(),
                        alternate_name: alt,
                    });
                    last_open = Some(devices.len() - 1);
                }
            }
        }
    }

    dedup_in_order(devices)
}

/// A declaration is audio when its kind token says so, or when the kind is
/// missing/unknown but the line carries a literal `(audio)` marker outside an
/// explicit video section. The permissive branch keeps devices from tool
/// versions that omit section headers.
fn is_audio_declaration(kind: &str, line: &str, section: Section) -> bool {
    if kind.eq_ignore_ascii_case("audio") {
        return true;
    }
    if kind.eq_ignore_ascii_case("video") {
        return false;
    }
    section != Section::Video && line.to_lowercase().contains("(audio)")
}

// e.g. `[dshow @ 000001a2b3c4] "CABLE Output" (audio)`
fn strip_diag_prefix(line: &str) -> &str {
    let s = line.trim_start();
    if s.starts_with('[') {
        if let Some(end) = s.find(']') {
            return s[end + 1..].trim_start();
        }
    }
    s
}

fn dedup_in_order(devices: Vec<DeviceDescriptor>) -> Vec<DeviceDescriptor> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(devices.len());
    for device in devices {
        if seen.insert((device.display_name.clone(), device.alternate_name.clone())) {
            unique.push(device);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    const CABLE_LISTING: &str = concat!(
        "[dshow @ 0000018c2f3a4b] DirectShow audio devices\n",
        "[dshow @ 0000018c2f3a4b] \"CABLE Output (VB-Audio Virtual Cable)\" (audio)\n",
        "[dshow @ 0000018c2f3a4b]   Alternative name \"@device_cm_{33D9A762}\\wave_{B3F2}\"\n",
    );

    #[test]
    fn test_declaration_with_alternate() {
        let devices = parse_device_list(CABLE_LISTING);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].display_name, "CABLE Output (VB-Audio Virtual Cable)");
        assert_eq!(devices[0].alternate_name, "@device_cm_{33D9A762}\\wave_{B3F2}");
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let doubled = format!("{CABLE_LISTING}{CABLE_LISTING}");
        let once = parse_device_list(CABLE_LISTING);
        let twice = parse_device_list(&doubled);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_headerless_audio_kind() {
        let text = "\"Microphone (USB Audio)\" (audio)\n";
        let devices = parse_device_list(text);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].display_name, "Microphone (USB Audio)");
        assert!(devices[0].alternate_name.is_empty());
    }

    #[test]
    fn test_ambiguous_kind_with_audio_marker() {
        // No kind token we recognize, but the literal `(audio)` appears and
        // no video section is active.
        let text = "\"Loopback (audio) bridge\" (wdm)\n";
        let devices = parse_device_list(text);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].display_name, "Loopback (audio) bridge");
    }

    #[test]
    fn test_ambiguous_kind_inside_video_section() {
        let text = concat!(
            "DirectShow video devices\n",
            "\"Webcam (audio) passthrough\" (wdm)\n",
        );
        assert!(parse_device_list(text).is_empty());
    }

    #[test]
    fn test_video_declarations_skipped() {
        let text = concat!(
            "DirectShow video devices\n",
            "\"Integrated Webcam\" (video)\n",
            "DirectShow audio devices\n",
            "\"Microphone Array\" (audio)\n",
        );
        let devices = parse_device_list(text);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].display_name, "Microphone Array");
    }

    #[test]
    fn test_orphan_alternate_name() {
        let text = "  Alternative name \"@device_cm_{GUID}\\wave_{GUID}\"\n";
        let devices = parse_device_list(text);
        assert_eq!(devices.len(), 1);
        assert!(devices[0].display_name.is_empty());
        assert_eq!(devices[0].alternate_name, "@device_cm_{GUID}\\wave_{GUID}");
    }

    #[test]
    fn test_duplicate_pairs_removed() {
        let text = concat!(
            "\"Mic\" (audio)\n",
            "\"Mic\" (audio)\n",
            "\"Mic B\" (audio)\n",
        );
        let devices = parse_device_list(text);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].display_name, "Mic");
        assert_eq!(devices[1].display_name, "Mic B");
    }
}
