use std::time::Duration;

use crate::pipeline::EngineState;

/// How a failure affects the play-state machine.
///
/// Only the severity drives control flow; the text of a [`PipelineError`]
/// is for display and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stop ticking, show the diagnostic and wait for an explicit reopen.
    Fatal,
    /// Rebuild the engine handle and carry on.
    Recoverable,
    /// Skip the affected update for this tick and retry on the next one.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to create playback pipeline: {0}")]
    CreationFailed(String),

    #[error("Pipeline refused to change state to {}", target.name())]
    TransitionFailed { target: EngineState },

    #[error("Could not query current duration")]
    DurationQueryFailed,

    #[error("Could not query current position")]
    PositionQueryFailed,

    #[error("Seeking query failed")]
    SeekQueryFailed,

    #[error("Seek to {position:?} was rejected")]
    SeekFailed { position: Duration },

    /// Reported by the engine itself; the message is shown as-is.
    #[error("{message}")]
    Fatal { message: String },
}

impl PipelineError {
    pub fn severity(&self) -> Severity {
        match self {
            PipelineError::CreationFailed(_) | PipelineError::Fatal { .. } => Severity::Fatal,
            PipelineError::TransitionFailed { .. } => Severity::Recoverable,
            PipelineError::DurationQueryFailed
            | PipelineError::PositionQueryFailed
            | PipelineError::SeekQueryFailed
            | PipelineError::SeekFailed { .. } => Severity::Transient,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
