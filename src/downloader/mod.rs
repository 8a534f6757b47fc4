//! External download delegates
//!
//! The runner only knows the [`MediaFetcher`] contract. The yt-dlp backend
//! does the network fetch and conversion; trimming is a separate ffmpeg pass
//! over whatever file the fetch produced.

pub mod progress;
pub mod trim;
pub mod ytdlp;

pub use progress::TransferProgress;
pub use ytdlp::YtDlpFetcher;

use crate::queue::job::{Job, JobId, MediaFormat, MediaKind, TrimRange};
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Everything a fetcher needs to process one job
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub job_id: JobId,
    pub source: String,
    pub kind: MediaKind,
    pub format: MediaFormat,
    pub trim: TrimRange,
    pub destination: PathBuf,
}

impl FetchRequest {
    pub fn for_job(job: &Job, destination: &Path) -> Self {
        Self {
            job_id: job.id.clone(),
            source: job.source.clone(),
            kind: job.kind,
            format: job.format,
            trim: job.trim.clone(),
            destination: destination.to_path_buf(),
        }
    }
}

/// Contract for the component that actually downloads and converts media
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Short identifier used in logs (e.g. "yt-dlp")
    fn id(&self) -> &'static str;

    /// Verify the external tools this fetcher depends on are usable.
    ///
    /// Called once before a run starts; an error here aborts the run
    /// before any job is touched.
    async fn check_ready(&self) -> Result<()>;

    /// Fetch, convert and trim one job into `request.destination`.
    ///
    /// Progress is reported on `progress` while the transfer runs. Returns
    /// the path of the finished file.
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf>;
}
