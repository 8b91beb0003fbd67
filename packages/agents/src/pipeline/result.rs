//! Per-invocation result and its status state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::stage::StagePayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    /// Pending → Running | Skipped | Failed, Running → Completed | Failed.
    /// Completed, Failed and Skipped are terminal.
    pub fn can_transition_to(self, next: StageStatus) -> bool {
        use StageStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Skipped)
                | (Pending, Failed)
                | (Running, Completed)
                | (Running, Failed)
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of one stage invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub stage_name: String,
    pub status: StageStatus,
    pub payload: Option<StagePayload>,
    pub error: Option<String>,
    /// Seconds, measured with a monotonic clock.
    pub execution_time: Option<f64>,
    /// Start time of the invocation.
    pub timestamp: Option<DateTime<Utc>>,
}

impl AgentResult {
    pub fn pending(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            status: StageStatus::Pending,
            payload: None,
            error: None,
            execution_time: None,
            timestamp: None,
        }
    }

    fn transition(&mut self, next: StageStatus) -> Result<(), PipelineError> {
        if !self.status.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                stage: self.stage_name.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.transition(StageStatus::Running)?;
        self.timestamp = Some(at);
        Ok(())
    }

    pub fn complete(&mut self, payload: StagePayload, elapsed: f64) -> Result<(), PipelineError> {
        self.transition(StageStatus::Completed)?;
        self.payload = Some(payload);
        self.execution_time = Some(elapsed);
        Ok(())
    }

    pub fn fail(
        &mut self,
        error: impl Into<String>,
        elapsed: Option<f64>,
    ) -> Result<(), PipelineError> {
        self.transition(StageStatus::Failed)?;
        self.error = Some(error.into());
        self.execution_time = elapsed;
        Ok(())
    }

    pub fn skip(&mut self, reason: impl Into<String>) -> Result<(), PipelineError> {
        self.transition(StageStatus::Skipped)?;
        self.error = Some(reason.into());
        Ok(())
    }

    pub fn storage_failures(&self) -> usize {
        self.payload
            .as_ref()
            .map_or(0, StagePayload::storage_failures)
    }
}
