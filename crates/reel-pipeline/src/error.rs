//! Pipeline error types.
//!
//! These are orchestration errors surfaced to callers. Stage failures are
//! not here: they are captured on the project record and observed through
//! status polling, never thrown past the orchestrator boundary.

use thiserror::Error;

use reel_models::{ProjectId, ProjectStatus};

/// Result type for orchestrator operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No stage registered for status '{0}'")]
    NoStageRegistered(ProjectStatus),

    #[error("Project {0} is already being driven")]
    AlreadyRunning(ProjectId),

    #[error("Invalid state for this operation: {0}")]
    InvalidState(String),

    #[error("Store error: {0}")]
    Store(#[from] reel_store::StoreError),
}

impl PipelineError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
