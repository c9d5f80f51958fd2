//! Scheduler error types.

use thiserror::Error;

use crate::cron::CronParseError;

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Schedule parse error: {0}")]
    Parse(#[from] CronParseError),

    #[error("Store error: {0}")]
    Store(#[from] reel_store::StoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] reel_pipeline::PipelineError),
}
