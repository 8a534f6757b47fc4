//! Terminal front end: owns the queue, the runner and the view

use crate::downloader::MediaFetcher;
use crate::queue::{
    parse_sources, JobId, JobOptions, JobPatch, QueueStore, RunEvent, RunSummary,
    SequentialRunner, SharedQueue,
};
use crate::utils::config::{AppSettings, SettingsFile};
use crate::utils::error::LoaderError;
use crate::utils::paths;
use crate::view::{render_row, QueueView};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Capacity of the runner -> presentation event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// How run events are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

pub struct App {
    queue: SharedQueue,
    runner: SequentialRunner,
    fetcher: Arc<dyn MediaFetcher>,
    settings: AppSettings,
    settings_file: SettingsFile,
    view: QueueView,
}

impl App {
    /// Create the app with settings loaded from `settings_file`
    pub fn new(settings_file: SettingsFile, fetcher: Arc<dyn MediaFetcher>) -> Self {
        let settings = settings_file.load();
        info!("Destination: {}", settings.destination.display());

        Self {
            queue: QueueStore::new().into_shared(),
            runner: SequentialRunner::new(),
            fetcher,
            settings,
            settings_file,
            view: QueueView::default(),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn queue(&self) -> SharedQueue {
        Arc::clone(&self.queue)
    }

    pub fn view(&self) -> &QueueView {
        &self.view
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Queue one job per non-blank line of `text`
    pub async fn submit(&mut self, text: &str, options: &JobOptions) -> Result<Vec<JobId>> {
        let sources = parse_sources(text);
        if sources.is_empty() {
            return Err(LoaderError::Validation("no URLs given".to_string()).into());
        }

        let result = self.queue.lock().await.submit(sources, options);
        self.refresh_view().await;
        let ids = result?;
        info!("Queued {} job(s)", ids.len());
        Ok(ids)
    }

    pub async fn edit(&mut self, id: &JobId, patch: &JobPatch) -> Result<()> {
        self.queue.lock().await.update(id, patch)?;
        self.refresh_view().await;
        Ok(())
    }

    pub async fn remove(&mut self, ids: &HashSet<JobId>) -> usize {
        let removed = self.queue.lock().await.remove(ids);
        self.refresh_view().await;
        removed
    }

    pub async fn clear(&mut self) {
        self.queue.lock().await.clear();
        self.refresh_view().await;
    }

    /// Change the destination folder and persist it
    pub fn set_destination(&mut self, destination: &Path) -> Result<()> {
        let destination = paths::absolute(destination);
        std::fs::create_dir_all(&destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        self.settings_file.save_destination(&destination)?;
        self.settings.destination = destination;
        Ok(())
    }

    /// Run every pending job, writing progress to `out` as events arrive
    pub async fn run_queue<W: Write>(
        &mut self,
        out: &mut W,
        mode: OutputMode,
    ) -> Result<RunSummary> {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = self
            .runner
            .run(
                self.queue(),
                self.settings.destination.clone(),
                Arc::clone(&self.fetcher),
                events_tx,
            )
            .await?;

        // Rows for jobs queued before the run started
        self.refresh_view().await;

        while let Some(event) = events_rx.recv().await {
            self.show_event(out, &event, mode)?;
            if matches!(event, RunEvent::Finished { .. }) {
                break;
            }
        }

        Ok(handle.wait().await?)
    }

    fn show_event<W: Write>(
        &mut self,
        out: &mut W,
        event: &RunEvent,
        mode: OutputMode,
    ) -> Result<()> {
        let row = self.view.apply(event).map(render_row);

        match mode {
            OutputMode::Json => writeln!(out, "{}", event.to_json_line()?)?,
            OutputMode::Text => match event {
                RunEvent::Started {
                    destination,
                    pending,
                    ..
                } => writeln!(
                    out,
                    "Downloading {} job(s) into {}",
                    pending,
                    destination.display()
                )?,
                RunEvent::Status { .. } => {
                    if let Some(line) = row {
                        writeln!(out, "{}", line)?;
                    }
                }
                RunEvent::Finished {
                    destination,
                    summary,
                    ..
                } => writeln!(
                    out,
                    "Finished: {} complete, {} failed. Files are in {}",
                    summary.completed,
                    summary.failed,
                    destination.display()
                )?,
            },
        }
        out.flush()?;
        Ok(())
    }

    async fn refresh_view(&mut self) {
        let snapshot = self.queue.lock().await.snapshot();
        self.view.refresh(&snapshot);
    }
}
