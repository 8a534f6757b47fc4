//! Ordered job store
//!
//! Insertion order is execution order. The store never reorders jobs; edits
//! and removals keep the relative order of whatever remains.

use crate::queue::job::{Job, JobId, JobOptions, JobPatch, JobStatus};
use crate::utils::error::LoaderError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Store shared between the presentation side and the runner
pub type SharedQueue = Arc<Mutex<QueueStore>>;

/// Ordered, mutable collection of jobs
#[derive(Debug, Default)]
pub struct QueueStore {
    jobs: Vec<Job>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store for sharing with a runner
    pub fn into_shared(self) -> SharedQueue {
        Arc::new(Mutex::new(self))
    }

    /// Append a job at the tail
    pub fn append(&mut self, job: Job) -> Result<JobId, LoaderError> {
        job.validate()?;
        if self.jobs.iter().any(|j| j.id == job.id) {
            return Err(LoaderError::Validation(format!(
                "job id {} is already queued",
                job.id
            )));
        }

        let id = job.id.clone();
        debug!("Queued job {} ({})", id, job.source);
        self.jobs.push(job);
        Ok(id)
    }

    /// Create one pending job per source and append them in order.
    ///
    /// Stops at the first invalid source; jobs appended before it stay queued.
    pub fn submit<'a, I>(
        &mut self,
        sources: I,
        options: &JobOptions,
    ) -> Result<Vec<JobId>, LoaderError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids = Vec::new();
        for source in sources {
            let job = Job::new(source, options)?;
            ids.push(self.append(job)?);
        }
        Ok(ids)
    }

    /// Remove every job whose id is in `ids`, whatever its status.
    ///
    /// Returns how many jobs were removed; unknown ids are ignored.
    pub fn remove(&mut self, ids: &HashSet<JobId>) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|job| !ids.contains(&job.id));
        let removed = before - self.jobs.len();
        if removed > 0 {
            info!("Removed {} job(s) from queue", removed);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
        info!("Cleared queue");
    }

    /// Apply field changes to a pending job.
    ///
    /// The job is left untouched if it is no longer pending or the patch
    /// would make it invalid.
    pub fn update(&mut self, id: &JobId, patch: &JobPatch) -> Result<(), LoaderError> {
        let job = self
            .jobs
            .iter_mut()
            .find(|j| &j.id == id)
            .ok_or_else(|| LoaderError::JobNotFound(id.to_string()))?;

        if !job.status.is_pending() {
            return Err(LoaderError::InvalidState {
                id: id.to_string(),
                status: job.status.label().to_string(),
            });
        }

        *job = patch.apply_to(job)?;
        Ok(())
    }

    /// Move a job's status forward
    pub fn advance(&mut self, id: &JobId, status: JobStatus) -> Result<(), LoaderError> {
        let job = self
            .jobs
            .iter_mut()
            .find(|j| &j.id == id)
            .ok_or_else(|| LoaderError::JobNotFound(id.to_string()))?;

        if !job.status.can_advance_to(&status) {
            return Err(LoaderError::InvalidState {
                id: id.to_string(),
                status: job.status.label().to_string(),
            });
        }

        job.status = status;
        Ok(())
    }

    /// Flip the first pending job to `Running { progress: 0 }` and return a copy of it
    pub fn claim_next_pending(&mut self) -> Option<Job> {
        let job = self.jobs.iter_mut().find(|j| j.status.is_pending())?;
        job.status = JobStatus::Running { progress: 0 };
        Some(job.clone())
    }

    /// Owned, ordered copy of the queue for rendering
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.clone()
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.status.is_pending()).count()
    }
}

/// Split free text into job sources, one per non-blank line
pub fn parse_sources(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
