//! Sequential queue runner
//!
//! One background task walks the queue in insertion order and hands each
//! pending job to a [`MediaFetcher`]. Status changes are written to the store
//! and posted as [`RunEvent`]s; the presentation side drains the channel and
//! is the only writer of its own view state.

use crate::downloader::{FetchRequest, MediaFetcher, TransferProgress};
use crate::queue::events::{RunEvent, RunSummary};
use crate::queue::job::{Job, JobId, JobStatus};
use crate::queue::store::SharedQueue;
use crate::utils::error::LoaderError;
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Capacity of the per-job progress channel handed to the fetcher
const PROGRESS_CHANNEL_CAPACITY: usize = 100;

/// Runs the queue one job at a time. At most one run is active per runner.
#[derive(Debug, Clone, Default)]
pub struct SequentialRunner {
    active: Arc<AtomicBool>,
}

/// Handle to a run in progress
#[derive(Debug)]
pub struct RunHandle {
    join_handle: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Wait for the run to visit every job
    pub async fn wait(self) -> Result<RunSummary, LoaderError> {
        self.join_handle
            .await
            .map_err(|e| LoaderError::WorkerStopped(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

/// Clears the runner's active flag when the worker ends, even if it panics
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SequentialRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a pass over the queue.
    ///
    /// Fails with [`LoaderError::AlreadyRunning`] if a pass is still active,
    /// and with [`LoaderError::PreconditionFailed`] if the fetcher reports its
    /// tools as unusable. In both cases no job is touched.
    pub async fn run(
        &self,
        queue: SharedQueue,
        destination: PathBuf,
        fetcher: Arc<dyn MediaFetcher>,
        events: mpsc::Sender<RunEvent>,
    ) -> Result<RunHandle, LoaderError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Queue run requested while another run is active");
            return Err(LoaderError::AlreadyRunning);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        if let Err(e) = fetcher.check_ready().await {
            error!("{} is not ready: {:#}", fetcher.id(), e);
            return Err(LoaderError::PreconditionFailed(e.to_string()));
        }

        let pending = queue.lock().await.pending_count();
        info!(
            "Starting queue run: {} pending job(s) into {}",
            pending,
            destination.display()
        );

        let join_handle = tokio::spawn(async move {
            let _ = events
                .send(RunEvent::started(destination.clone(), pending))
                .await;

            let summary = process_queue(&queue, &destination, &fetcher, &events).await;

            info!(
                "Queue run finished: {} completed, {} failed",
                summary.completed, summary.failed
            );

            // Release before announcing so a listener can start the next run immediately
            drop(guard);
            let _ = events
                .send(RunEvent::finished(destination, summary))
                .await;
            summary
        });

        Ok(RunHandle { join_handle })
    }
}

/// Claim and process pending jobs until none are left
async fn process_queue(
    queue: &SharedQueue,
    destination: &Path,
    fetcher: &Arc<dyn MediaFetcher>,
    events: &mpsc::Sender<RunEvent>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    loop {
        // Lock only long enough to claim; the fetch below runs unlocked
        let job = match queue.lock().await.claim_next_pending() {
            Some(job) => job,
            None => break,
        };

        let _ = events
            .send(RunEvent::status(job.id.clone(), JobStatus::Running { progress: 0 }))
            .await;

        let status = process_job(queue, &job, destination, fetcher, events).await;
        match status {
            JobStatus::Complete => summary.completed += 1,
            _ => summary.failed += 1,
        }

        set_status(queue, &job.id, status.clone()).await;
        let _ = events.send(RunEvent::status(job.id, status)).await;
    }

    summary
}

/// Run the fetcher for one job and turn its outcome into a terminal status
async fn process_job(
    queue: &SharedQueue,
    job: &Job,
    destination: &Path,
    fetcher: &Arc<dyn MediaFetcher>,
    events: &mpsc::Sender<RunEvent>,
) -> JobStatus {
    let request = FetchRequest::for_job(job, destination);
    let (progress_tx, progress_rx) = mpsc::channel::<TransferProgress>(PROGRESS_CHANNEL_CAPACITY);

    let forwarder = tokio::spawn(forward_progress(
        Arc::clone(queue),
        job.id.clone(),
        progress_rx,
        events.clone(),
    ));

    // Own task per fetch so a panicking fetcher fails this job only
    let fetch_task = {
        let fetcher = Arc::clone(fetcher);
        tokio::spawn(async move { fetcher.fetch(&request, progress_tx).await })
    };
    let result = match fetch_task.await {
        Ok(result) => result,
        Err(e) => Err(anyhow!("fetcher panicked: {}", e)),
    };

    // The fetcher has dropped its sender; wait for the last progress event to go out
    if let Err(e) = forwarder.await {
        warn!("Progress forwarder for job {} ended abnormally: {}", job.id, e);
    }

    match result {
        Ok(path) => {
            info!("Job {} complete: {}", job.id, path.display());
            JobStatus::Complete
        }
        Err(e) => {
            error!("Job {} ({}) failed: {:#}", job.id, job.source, e);
            JobStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Turn byte counters into `Running(percent)` updates for one job
async fn forward_progress(
    queue: SharedQueue,
    job_id: JobId,
    mut progress_rx: mpsc::Receiver<TransferProgress>,
    events: mpsc::Sender<RunEvent>,
) {
    let mut last_percent = 0u8;

    while let Some(progress) = progress_rx.recv().await {
        let percent = progress.percent();
        if percent == last_percent {
            continue;
        }
        last_percent = percent;

        debug!("Job {} at {}%", job_id, percent);
        let status = JobStatus::Running { progress: percent };
        set_status(&queue, &job_id, status.clone()).await;
        let _ = events.send(RunEvent::status(job_id.clone(), status)).await;
    }
}

/// Record a status in the store. Jobs removed mid-run are ignored.
async fn set_status(queue: &SharedQueue, job_id: &JobId, status: JobStatus) {
    if let Err(e) = queue.lock().await.advance(job_id, status) {
        debug!("Status for job {} not recorded: {}", job_id, e);
    }
}
