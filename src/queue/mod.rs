pub mod events;
pub mod job;
pub mod runner;
pub mod store;

pub use events::{RunEvent, RunSummary};
pub use job::{Job, JobId, JobOptions, JobPatch, JobStatus, MediaFormat, MediaKind, TrimRange};
pub use runner::{RunHandle, SequentialRunner};
pub use store::{parse_sources, QueueStore, SharedQueue};
