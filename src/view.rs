//! Presentation-side model of the queue
//!
//! Built from store snapshots and updated only by applying [`RunEvent`]s
//! drained on the presentation side. Nothing on the worker side writes here.

use crate::queue::{Job, JobId, JobStatus, MediaFormat, RunEvent, RunSummary};

const BAR_WIDTH: usize = 20;

/// One rendered queue row
#[derive(Debug, Clone, PartialEq)]
pub struct QueueRow {
    pub id: JobId,
    pub source: String,
    pub format: MediaFormat,
    pub status: JobStatus,
}

impl From<&Job> for QueueRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            source: job.source.clone(),
            format: job.format,
            status: job.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueueView {
    rows: Vec<QueueRow>,
    last_summary: Option<RunSummary>,
}

impl QueueView {
    pub fn from_snapshot(jobs: &[Job]) -> Self {
        let mut view = Self::default();
        view.refresh(jobs);
        view
    }

    /// Replace rows with a fresh snapshot (after submit, edit or removal)
    pub fn refresh(&mut self, jobs: &[Job]) {
        self.rows = jobs.iter().map(QueueRow::from).collect();
    }

    /// Apply a runner event. Returns the row it changed, if any.
    pub fn apply(&mut self, event: &RunEvent) -> Option<&QueueRow> {
        match event {
            RunEvent::Started { .. } => {
                self.last_summary = None;
                None
            }
            RunEvent::Status { job_id, status, .. } => {
                let row = self.rows.iter_mut().find(|r| &r.id == job_id)?;
                row.status = status.clone();
                Some(&*row)
            }
            RunEvent::Finished { summary, .. } => {
                self.last_summary = Some(*summary);
                None
            }
        }
    }

    pub fn rows(&self) -> &[QueueRow] {
        &self.rows
    }

    /// Summary of the most recent finished run
    pub fn last_summary(&self) -> Option<RunSummary> {
        self.last_summary
    }
}

/// `[#####---------------]  25%  Running  mp3  http://...`
pub fn render_row(row: &QueueRow) -> String {
    let percent = match &row.status {
        JobStatus::Pending => 0,
        JobStatus::Running { progress } => *progress,
        JobStatus::Complete => 100,
        JobStatus::Failed { .. } => 0,
    };
    let mut line = format!(
        "{} {:>3}%  {:<8} {:<4} {}",
        progress_bar(percent),
        percent,
        row.status.label(),
        row.format,
        row.source
    );
    if let JobStatus::Failed { reason } = &row.status {
        line.push_str(&format!("  ({})", reason));
    }
    line
}

fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
