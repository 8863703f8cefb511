//! Session and segment bookkeeping.
//!
//! A [`RecordingSession`] is created on start and consumed at finalization.
//! It owns every [`Segment`] record exclusively; segments are never shared
//! outside the session.

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    OUTPUT_EXTENSION, OUTPUT_PREFIX, SEGMENT_DIR_PREFIX, SEGMENT_FILE_PREFIX, TIMESTAMP_FORMAT,
};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Segment {
    /// 1-based, strictly increasing within a session.
    pub sequence_index: u32,
    pub path: PathBuf,
    pub status: SegmentStatus,
}

#[derive(Debug)]
pub struct RecordingSession {
    pub base_timestamp: String,
    pub segment_dir: PathBuf,
    pub segments: Vec<Segment>,
    /// Fixed at creation; finalization writes here.
    pub final_output_path: PathBuf,
}

impl RecordingSession {
    /// Creates the session working directory next to the final output file.
    pub fn create(output_dir: &Path) -> Result<Self> {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::create_at(output_dir, timestamp)
    }

    fn create_at(output_dir: &Path, timestamp: String) -> Result<Self> {
        let final_output_path =
            output_dir.join(format!("{OUTPUT_PREFIX}{timestamp}.{OUTPUT_EXTENSION}"));
        let segment_dir = output_dir.join(format!("{SEGMENT_DIR_PREFIX}{timestamp}"));
        fs::create_dir_all(&segment_dir)?;
        Ok(Self {
            base_timestamp: timestamp,
            segment_dir,
            segments: Vec::new(),
            final_output_path,
        })
    }

    /// Allocates the next segment record and returns its sequence number and
    /// file path.
    pub fn begin_segment(&mut self) -> (u32, PathBuf) {
        let sequence = self.segments.len() as u32 + 1;
        let path = self
            .segment_dir
            .join(format!("{SEGMENT_FILE_PREFIX}{sequence:02}.{OUTPUT_EXTENSION}"));
        self.segments.push(Segment {
            sequence_index: sequence,
            path: path.clone(),
            status: SegmentStatus::Pending,
        });
        (sequence, path)
    }

    /// Finalizes a pending segment. Returns `false` when the segment is
    /// unknown or already finalized.
    pub fn finish_segment(&mut self, sequence: u32, status: SegmentStatus) -> bool {
        match self
            .segments
            .iter_mut()
            .find(|s| s.sequence_index == sequence && s.status == SegmentStatus::Pending)
        {
            Some(segment) => {
                segment.status = status;
                true
            }
            None => false,
        }
    }

    pub fn completed_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.status == SegmentStatus::Completed)
    }

    pub fn has_completed_segments(&self) -> bool {
        self.completed_segments().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::create(dir.path()).unwrap();

        let (first, first_path) = session.begin_segment();
        let (second, second_path) = session.begin_segment();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert!(first_path.ends_with("seg01.mp4"));
        assert!(second_path.ends_with("seg02.mp4"));
        assert!(session.segment_dir.is_dir());
        assert!(session
            .segment_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(".segments_"));
    }

    #[test]
    fn test_final_output_naming() {
        let dir = tempfile::tempdir().unwrap();
        let session = RecordingSession::create_at(dir.path(), "20260829_120000".into()).unwrap();
        assert_eq!(
            session.final_output_path,
            dir.path().join("record_20260829_120000.mp4")
        );
        assert_eq!(session.segment_dir, dir.path().join(".segments_20260829_120000"));
    }

    #[test]
    fn test_finish_segment_is_one_shot() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = RecordingSession::create(dir.path()).unwrap();
        let (sequence, _) = session.begin_segment();

        assert!(session.finish_segment(sequence, SegmentStatus::Completed));
        // Already finalized; a late watcher notification must not flip it.
        assert!(!session.finish_segment(sequence, SegmentStatus::Failed));
        assert!(session.has_completed_segments());
        assert!(!session.finish_segment(99, SegmentStatus::Completed));
    }
}
