use thiserror::Error;

use super::result::StageStatus;
use super::stage::StageName;

/// Failure of a single stage invocation. Recorded on the stage's result, never propagated.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{stage}: invalid input: {message}")]
    InvalidInput { stage: StageName, message: String },

    #[error("{stage} panicked: {message}")]
    Panicked { stage: StageName, message: String },
}

impl StageError {
    pub fn invalid_input(stage: StageName, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            stage,
            message: message.into(),
        }
    }
}

/// Orchestration bookkeeping errors.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("invalid status transition for {stage}: {from} -> {to}")]
    InvalidTransition {
        stage: String,
        from: StageStatus,
        to: StageStatus,
    },

    #[error("payload from {found} handed over as {expected}")]
    PayloadMismatch {
        expected: StageName,
        found: StageName,
    },

    #[error("Agent {0} not found")]
    UnknownStage(String),
}
