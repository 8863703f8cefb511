//! Session finalization.
//!
//! A single completed segment is renamed to the final output path, which
//! keeps its bytes identical to what the encoder wrote. Multiple segments are
//! stream-copy concatenated through the external tool's concat demuxer, so no
//! re-encode happens either way. Intermediate files are deleted only after
//! the output is confirmed; any failure leaves them in place for diagnosis.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::constants::CONCAT_LIST_NAME;
use crate::devices::decode::decode_console_bytes;
use crate::devices::probe::resolve_executable;
use crate::error::{RecorderError, Result};
use crate::ffmpeg::session::{RecordingSession, Segment};

/// Finalizes a session into its output file and removes the segment
/// directory. Returns the final output path.
pub fn finalize(session: &RecordingSession, ffmpeg_path: &str) -> Result<PathBuf> {
    let completed: Vec<&Segment> = session.completed_segments().collect();

    match completed.len() {
        0 => Err(RecorderError::NoSegmentsToFinalize),
        1 => {
            info!(
                "single segment, renaming {} -> {}",
                completed[0].path.display(),
                session.final_output_path.display()
            );
            fs::rename(&completed[0].path, &session.final_output_path)?;
            cleanup_segment_dir(session)?;
            Ok(session.final_output_path.clone())
        }
        n => {
            info!("concatenating {n} segments into {}", session.final_output_path.display());
            concat_segments(session, &completed, ffmpeg_path)?;
            for segment in &completed {
                fs::remove_file(&segment.path)?;
            }
            fs::remove_file(session.segment_dir.join(CONCAT_LIST_NAME))?;
            cleanup_segment_dir(session)?;
            Ok(session.final_output_path.clone())
        }
    }
}

fn concat_segments(
    session: &RecordingSession,
    segments: &[&Segment],
    ffmpeg_path: &str,
) -> Result<()> {
    let list_path = session.segment_dir.join(CONCAT_LIST_NAME);
    write_concat_list(segments, &list_path)?;

    let exe = resolve_executable(ffmpeg_path)
        .ok_or_else(|| RecorderError::ToolNotFound(ffmpeg_path.to_string()))?;

    let output = Command::new(&exe)
        .args(["-y", "-hide_banner", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(&session.final_output_path)
        .output()?;

    if !output.status.success() {
        let stderr = decode_console_bytes(&output.stderr);
        let tail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
        return Err(RecorderError::ConcatFailed(format!(
            "exit {}: {tail}",
            output.status.code().unwrap_or(-1)
        )));
    }
    Ok(())
}

/// Writes the concat demuxer list: one `file '<path>'` line per segment,
/// forward slashes, single quotes escaped.
pub fn write_concat_list(segments: &[&Segment], list_path: &Path) -> Result<()> {
    let mut lines = String::new();
    for segment in segments {
        lines.push_str(&concat_entry(&segment.path));
        lines.push('\n');
    }
    fs::write(list_path, lines)?;
    Ok(())
}

fn concat_entry(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let escaped = normalized.replace('\'', r"'\''");
    format!("file '{escaped}'")
}

/// Removes leftover failed-segment files and the (then empty) working
/// directory.
fn cleanup_segment_dir(session: &RecordingSession) -> Result<()> {
    for entry in fs::read_dir(&session.segment_dir)? {
        let entry = entry?;
        warn!("removing leftover segment file {}", entry.path().display());
        fs::remove_file(entry.path())?;
    }
    fs::remove_dir(&session.segment_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::session::SegmentStatus;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join(name);
        fs::write(&script, body).unwrap();
        let mut perms = fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).unwrap();
        script.to_string_lossy().into_owned()
    }

    /// Fake merge tool: reads the list file named after `-i` and appends each
    /// listed file's bytes to the last argument, like the real concat demuxer
    /// with `-c copy`.
    #[cfg(unix)]
    fn fake_concat_tool(dir: &Path) -> String {
        write_script(
            dir,
            "fake-concat.sh",
            "#!/bin/sh\n\
             prev=''\n\
             for a in \"$@\"; do\n\
               [ \"$prev\" = -i ] && list=\"$a\"\n\
               prev=\"$a\"\n\
               out=\"$a\"\n\
             done\n\
             : > \"$out\"\n\
             while IFS= read -r line; do\n\
               p=$(printf %s \"$line\" | cut -d\"'\" -f2)\n\
               cat \"$p\" >> \"$out\"\n\
             done < \"$list\"\n\
             exit 0\n",
        )
    }

    #[cfg(unix)]
    fn failing_concat_tool(dir: &Path) -> String {
        write_script(
            dir,
            "fake-concat-fail.sh",
            "#!/bin/sh\n\
             echo 'no suitable streams' >&2\n\
             exit 1\n",
        )
    }

    fn session_with_segments(dir: &Path, contents: &[&[u8]]) -> RecordingSession {
        let mut session = RecordingSession::create(dir).unwrap();
        for bytes in contents {
            let (sequence, path) = session.begin_segment();
            fs::write(&path, bytes).unwrap();
            session.finish_segment(sequence, SegmentStatus::Completed);
        }
        session
    }

    #[test]
    fn test_zero_segments_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::create(dir.path()).unwrap();
        let (sequence, path) = session.begin_segment();
        fs::write(&path, b"broken").unwrap();
        session.finish_segment(sequence, SegmentStatus::Failed);

        let err = finalize(&session, "ffmpeg").unwrap_err();
        assert!(matches!(err, RecorderError::NoSegmentsToFinalize));
        assert!(path.exists());
        assert!(session.segment_dir.exists());
    }

    #[test]
    fn test_single_segment_moves_bytes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let payload: &[u8] = b"ftypisom-fake-video-payload";
        let session = session_with_segments(dir.path(), &[payload]);

        let output = finalize(&session, "ffmpeg").unwrap();
        assert_eq!(output, session.final_output_path);
        assert_eq!(fs::read(&output).unwrap(), payload);
        assert!(!session.segment_dir.exists());
    }

    #[test]
    fn test_single_segment_sweeps_failed_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::create(dir.path()).unwrap();

        let (first, first_path) = session.begin_segment();
        fs::write(&first_path, b"good").unwrap();
        session.finish_segment(first, SegmentStatus::Completed);

        let (second, second_path) = session.begin_segment();
        fs::write(&second_path, b"").unwrap();
        session.finish_segment(second, SegmentStatus::Failed);

        finalize(&session, "ffmpeg").unwrap();
        assert!(!second_path.exists());
        assert!(!session.segment_dir.exists());
    }

    #[test]
    fn test_concat_list_contents() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_segments(dir.path(), &[b"a".as_slice(), b"b".as_slice()]);
        let segments: Vec<&Segment> = session.completed_segments().collect();
        let list_path = session.segment_dir.join("concat.txt");

        write_concat_list(&segments, &list_path).unwrap();
        let content = fs::read_to_string(&list_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].ends_with("seg01.mp4'"));
        assert!(lines[1].ends_with("seg02.mp4'"));
        assert!(!content.contains('\\'));
    }

    #[test]
    fn test_concat_entry_escapes_quotes() {
        let entry = concat_entry(Path::new("/tmp/it's here/seg01.mp4"));
        assert_eq!(entry, r"file '/tmp/it'\''s here/seg01.mp4'");
    }

    #[cfg(unix)]
    #[test]
    fn test_multi_segment_merge_cleans_up_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_concat_tool(dir.path());
        let session = session_with_segments(dir.path(), &[b"AAA".as_slice(), b"BBB".as_slice()]);

        let output = finalize(&session, &tool).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"AAABBB");
        // Segments, list file, and working directory are gone.
        for segment in session.completed_segments() {
            assert!(!segment.path.exists());
        }
        assert!(!session.segment_dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_concat_failure_preserves_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let tool = failing_concat_tool(dir.path());
        let session = session_with_segments(dir.path(), &[b"AAA".as_slice(), b"BBB".as_slice()]);

        let err = finalize(&session, &tool).unwrap_err();
        match err {
            RecorderError::ConcatFailed(message) => {
                assert!(message.contains("no suitable streams"));
            }
            other => panic!("expected ConcatFailed, got {other:?}"),
        }
        // Nothing is deleted until the output is confirmed.
        assert!(!session.final_output_path.exists());
        for segment in session.completed_segments() {
            assert!(segment.path.exists());
        }
        assert!(session.segment_dir.join(CONCAT_LIST_NAME).exists());
        assert!(session.segment_dir.exists());
    }

    #[test]
    fn test_missing_tool_preserves_segments() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_segments(dir.path(), &[b"a".as_slice(), b"b".as_slice()]);

        let err = finalize(&session, "/nonexistent/ffmpeg").unwrap_err();
        assert!(matches!(err, RecorderError::ToolNotFound(_)));
        for segment in session.completed_segments() {
            assert!(segment.path.exists());
        }
    }
}
