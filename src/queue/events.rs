use crate::queue::job::{JobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome counts for one pass over the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn visited(&self) -> usize {
        self.completed + self.failed
    }
}

/// Messages posted by the runner for the presentation side to drain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run began with this many pending jobs
    Started {
        destination: PathBuf,
        pending: usize,
        timestamp: DateTime<Utc>,
    },
    /// A job changed status (including progress ticks)
    Status {
        job_id: JobId,
        status: JobStatus,
        timestamp: DateTime<Utc>,
    },
    /// Every job has been visited. Sent exactly once per run.
    Finished {
        destination: PathBuf,
        summary: RunSummary,
        timestamp: DateTime<Utc>,
    },
}

impl RunEvent {
    pub fn started(destination: PathBuf, pending: usize) -> Self {
        Self::Started {
            destination,
            pending,
            timestamp: Utc::now(),
        }
    }

    pub fn status(job_id: JobId, status: JobStatus) -> Self {
        Self::Status {
            job_id,
            status,
            timestamp: Utc::now(),
        }
    }

    pub fn finished(destination: PathBuf, summary: RunSummary) -> Self {
        Self::Finished {
            destination,
            summary,
            timestamp: Utc::now(),
        }
    }

    /// Serialize as a single JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
