//! Scripted fetchers shared by the integration tests. Nothing here touches the network.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use medialoader::downloader::{FetchRequest, MediaFetcher, TransferProgress};
use medialoader::queue::RunEvent;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify, Semaphore};

/// Succeeds for every source except those listed in `failing`
#[derive(Default)]
pub struct ScriptedFetcher {
    pub failing: HashSet<String>,
    /// `(downloaded, total)` pairs reported before returning
    pub progress: Vec<(u64, Option<u64>)>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(sources: &[&str]) -> Self {
        Self {
            failing: sources.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_progress(steps: &[(u64, Option<u64>)]) -> Self {
        Self {
            progress: steps.to_vec(),
            ..Self::default()
        }
    }

    pub fn sources(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.source.clone())
            .collect()
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());

        for (downloaded, total) in &self.progress {
            progress
                .send(TransferProgress::new(*downloaded, *total))
                .await
                .ok();
        }

        if self.failing.contains(&request.source) {
            return Err(anyhow!("HTTP Error 404: Not Found"));
        }
        Ok(request
            .destination
            .join(format!("{}.{}", request.job_id, request.format)))
    }
}

/// Reports itself unusable, like a machine without ffmpeg
pub struct NotReadyFetcher;

#[async_trait]
impl MediaFetcher for NotReadyFetcher {
    fn id(&self) -> &'static str {
        "not-ready"
    }

    async fn check_ready(&self) -> Result<()> {
        Err(anyhow!("ffmpeg not found"))
    }

    async fn fetch(
        &self,
        _request: &FetchRequest,
        _progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf> {
        panic!("fetch must not be called when the precondition fails");
    }
}

/// Panics instead of returning for the listed sources, like a fetcher with a bug
pub struct PanickingFetcher {
    pub panics_on: HashSet<String>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl PanickingFetcher {
    pub fn new(sources: &[&str]) -> Self {
        Self {
            panics_on: sources.iter().map(|s| s.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn sources(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.source.clone())
            .collect()
    }
}

#[async_trait]
impl MediaFetcher for PanickingFetcher {
    fn id(&self) -> &'static str {
        "panicking"
    }

    async fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        _progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());
        if self.panics_on.contains(&request.source) {
            panic!("unexpected response for {}", request.source);
        }
        Ok(request.destination.join(request.job_id.to_string()))
    }
}

/// Parks inside every fetch until the test hands out a permit
pub struct GatedFetcher {
    pub started: Arc<Notify>,
    pub release: Arc<Semaphore>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl GatedFetcher {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Notify::new()),
            release: Arc::new(Semaphore::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for GatedFetcher {
    fn id(&self) -> &'static str {
        "gated"
    }

    async fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        _progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());
        self.started.notify_one();
        self.release.acquire().await?.forget();
        Ok(request.destination.join(request.job_id.to_string()))
    }
}

/// Drain events until (and including) `Finished`
pub async fn collect_until_finished(rx: &mut mpsc::Receiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = matches!(event, RunEvent::Finished { .. });
        events.push(event);
        if done {
            break;
        }
    }
    events
}

pub fn finished_count(events: &[RunEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RunEvent::Finished { .. }))
        .count()
}
