//! Run result types
//!
//! A `RunResult` is produced exactly once per pipeline invocation and
//! is never persisted.

use uuid::Uuid;

use crate::domain::stage::StageId;
use crate::error::{EXIT_SUCCESS, StageError};

/// Terminal state of a pipeline execution
#[derive(Debug)]
pub enum RunResult {
    /// Every selected stage completed
    Success,
    /// The first failing stage and its cause
    Failed { stage: StageId, error: StageError },
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success)
    }

    /// Process exit status for this result
    pub fn exit_code(&self) -> i32 {
        match self {
            RunResult::Success => EXIT_SUCCESS,
            RunResult::Failed { error, .. } => error.exit_code(),
        }
    }

    /// Stage that stopped the run, if any
    pub fn failed_stage(&self) -> Option<StageId> {
        match self {
            RunResult::Success => None,
            RunResult::Failed { stage, .. } => Some(*stage),
        }
    }
}

/// Record of one pipeline invocation
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    /// Stages that completed, in execution order
    pub completed: Vec<StageId>,
    pub result: RunResult,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.result.exit_code()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
