//! Front-end flows: submissions, destination persistence and event rendering.

mod common;

use common::{NotReadyFetcher, ScriptedFetcher};
use medialoader::app::{App, OutputMode};
use medialoader::queue::{JobOptions, JobPatch, JobStatus, MediaFormat, MediaKind, TrimRange};
use medialoader::utils::SettingsFile;
use medialoader::LoaderError;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn app_in(temp: &TempDir, fetcher: Arc<dyn medialoader::MediaFetcher>) -> App {
    let settings = SettingsFile::new(temp.path().join("config.txt"));
    let mut app = App::new(settings, fetcher);
    app.set_destination(&temp.path().join("out")).expect("set destination");
    app
}

#[tokio::test]
async fn submit_creates_one_job_per_line() {
    let temp = TempDir::new().expect("temp dir");
    let mut app = app_in(&temp, Arc::new(ScriptedFetcher::new()));

    let options = JobOptions {
        kind: MediaKind::Video,
        format: Some(MediaFormat::Webm),
        trim: TrimRange::new(Some("00:00:05"), None),
    };
    let ids = app
        .submit("http://a\n\n  http://b  \n", &options)
        .await
        .expect("submit");

    assert_eq!(ids.len(), 2);
    let rows = app.view().rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].source, "http://b");
    assert!(rows.iter().all(|r| r.format == MediaFormat::Webm));

    let snapshot = app.queue().lock().await.snapshot();
    assert_eq!(snapshot[0].trim.start.as_deref(), Some("00:00:05"));
}

#[tokio::test]
async fn blank_submission_is_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let mut app = app_in(&temp, Arc::new(ScriptedFetcher::new()));

    let err = app.submit(" \n\n", &JobOptions::default()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LoaderError>(),
        Some(LoaderError::Validation(_))
    ));
    assert!(app.view().rows().is_empty());
}

#[tokio::test]
async fn destination_is_persisted() {
    let temp = TempDir::new().expect("temp dir");
    let app = app_in(&temp, Arc::new(ScriptedFetcher::new()));
    let expected = temp.path().join("out");

    assert_eq!(app.settings().destination, expected);
    assert!(expected.is_dir());

    // A fresh app reads it back
    let reloaded = App::new(
        SettingsFile::new(temp.path().join("config.txt")),
        Arc::new(ScriptedFetcher::new()),
    );
    assert_eq!(reloaded.settings().destination, expected);
}

#[tokio::test]
async fn run_queue_renders_progress_and_summary() {
    let temp = TempDir::new().expect("temp dir");
    let fetcher = Arc::new(ScriptedFetcher::failing(&["http://bad"]));
    let mut app = app_in(&temp, fetcher.clone());

    app.submit("http://a\nhttp://bad\nhttp://c", &JobOptions::default())
        .await
        .unwrap();

    let mut out = Vec::new();
    let summary = app.run_queue(&mut out, OutputMode::Text).await.expect("run");
    let text = String::from_utf8(out).unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    assert!(text.starts_with("Downloading 3 job(s) into"));
    assert!(text.contains("Finished: 2 complete, 1 failed"));
    assert_eq!(text.matches("Finished:").count(), 1);

    let statuses: Vec<_> = app.view().rows().iter().map(|r| r.status.label()).collect();
    assert_eq!(statuses, vec!["Complete", "Failed", "Complete"]);
    assert_eq!(app.view().last_summary(), Some(summary));

    // Every job was fetched into the chosen destination
    let requests = fetcher.requests.lock().unwrap();
    assert!(requests.iter().all(|r| r.destination == temp.path().join("out")));
}

#[tokio::test]
async fn json_mode_emits_one_object_per_event() {
    let temp = TempDir::new().expect("temp dir");
    let mut app = app_in(&temp, Arc::new(ScriptedFetcher::new()));
    app.submit("http://a", &JobOptions::default()).await.unwrap();

    let mut out = Vec::new();
    app.run_queue(&mut out, OutputMode::Json).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    let kinds: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("valid json");
            value["event"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(kinds.first().map(String::as_str), Some("started"));
    assert_eq!(kinds.last().map(String::as_str), Some("finished"));
    assert!(kinds.iter().any(|k| k == "status"));
}

#[tokio::test]
async fn missing_tools_are_reported_before_any_job() {
    let temp = TempDir::new().expect("temp dir");
    let mut app = app_in(&temp, Arc::new(NotReadyFetcher));
    app.submit("http://a", &JobOptions::default()).await.unwrap();

    let mut out = Vec::new();
    let err = app.run_queue(&mut out, OutputMode::Text).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LoaderError>(),
        Some(LoaderError::PreconditionFailed(_))
    ));
    assert!(out.is_empty());
    assert!(!app.is_running());
    assert_eq!(app.view().rows()[0].status, JobStatus::Pending);
}

#[tokio::test]
async fn edit_and_remove_update_the_view() {
    let temp = TempDir::new().expect("temp dir");
    let mut app = app_in(&temp, Arc::new(ScriptedFetcher::new()));
    let ids = app
        .submit("http://a\nhttp://b\nhttp://c", &JobOptions::default())
        .await
        .unwrap();

    app.edit(
        &ids[0],
        &JobPatch {
            format: Some(MediaFormat::M4a),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(app.view().rows()[0].format, MediaFormat::M4a);

    let doomed: HashSet<_> = [ids[1].clone()].into();
    assert_eq!(app.remove(&doomed).await, 1);
    let sources: Vec<_> = app.view().rows().iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["http://a", "http://c"]);

    app.clear().await;
    assert!(app.view().rows().is_empty());
}
