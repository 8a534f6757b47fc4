//! Error handling for medialoader

use thiserror::Error;

/// Main error type for medialoader
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Malformed submission or edit (empty source, format not valid for kind).
    #[error("Invalid job: {0}")]
    Validation(String),

    /// Edit or transition attempted on a job in the wrong state.
    #[error("Job {id} is {status} and can no longer be changed")]
    InvalidState { id: String, status: String },

    #[error("A queue run is already in progress")]
    AlreadyRunning,

    #[error("Job failed: {0}")]
    JobFailed(String),

    /// A required external tool is missing or broken; no job was started.
    #[error("Cannot start queue: {0}")]
    PreconditionFailed(String),

    /// The background worker died before visiting every job.
    #[error("Queue worker stopped unexpectedly: {0}")]
    WorkerStopped(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("{0} not found. Please install it and make sure it is on PATH")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
