//! medialoader library

pub mod app;
pub mod downloader;
pub mod queue;
pub mod utils;
pub mod view;

// Re-export main types for easier use
pub use downloader::{FetchRequest, MediaFetcher, TransferProgress, YtDlpFetcher};
pub use queue::{
    Job, JobId, JobOptions, JobPatch, JobStatus, MediaFormat, MediaKind, QueueStore, RunEvent,
    RunSummary, SequentialRunner, SharedQueue,
};
pub use utils::{AppSettings, LoaderError};
