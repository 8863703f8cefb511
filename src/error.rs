use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("executable not found: {0}")]
    ToolNotFound(String),

    #[error("encoder failed to start: {0}")]
    ProcessStartFailed(String),

    #[error("segment {0} failed: {1}")]
    SegmentFailed(u32, String),

    #[error("nothing to save: no completed segments")]
    NoSegmentsToFinalize,

    #[error("concat failed: {0}")]
    ConcatFailed(String),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] io::Error),

    #[error("invalid state: {0}")]
    State(String),
}

impl RecorderError {
    /// Stable kind tag for event subscribers.
    pub fn kind(&self) -> &'static str {
        match self {
            RecorderError::ToolNotFound(_) => "tool-not-found",
            RecorderError::ProcessStartFailed(_) => "process-start-failed",
            RecorderError::SegmentFailed(_, _) => "segment-failed",
            RecorderError::NoSegmentsToFinalize => "no-segments",
            RecorderError::ConcatFailed(_) => "concat-failed",
            RecorderError::Filesystem(_) => "filesystem",
            RecorderError::State(_) => "state",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
