//! yt-dlp backed fetcher
//!
//! yt-dlp handles the network fetch, audio extraction and muxing; ffmpeg is
//! required by yt-dlp for conversion and by the trim pass afterwards.

use crate::downloader::progress::TransferProgress;
use crate::downloader::trim::{last_line, trim_in_place};
use crate::downloader::{FetchRequest, MediaFetcher};
use crate::queue::job::MediaKind;
use crate::utils::error::LoaderError;
use crate::utils::tools::{self, ToolPaths, FFMPEG, YTDLP};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const PROGRESS_PREFIX: &str = "[progress]";
const FILE_PREFIX: &str = "[file]";
const PROGRESS_TEMPLATE: &str = concat!(
    "download:[progress] %(progress.downloaded_bytes)s ",
    "%(progress.total_bytes)s %(progress.total_bytes_estimate)s"
);
const FILE_TEMPLATE: &str = "after_move:[file] %(filepath)s";
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
pub const DEFAULT_AUDIO_QUALITY: &str = "192K";

/// Fetcher that shells out to yt-dlp
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    tools: ToolPaths,
    audio_quality: String,
}

impl YtDlpFetcher {
    /// Create a fetcher using whatever yt-dlp/ffmpeg can be found on this machine.
    ///
    /// Missing tools are not an error here; they are reported by `check_ready`.
    pub fn new() -> Self {
        Self::with_tools(ToolPaths::discover())
    }

    pub fn with_tools(tools: ToolPaths) -> Self {
        Self {
            tools,
            audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
        }
    }

    /// Override the audio bitrate passed to `--audio-quality`
    pub fn with_audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.audio_quality = quality.into();
        self
    }

    fn ytdlp_path(&self) -> Result<&Path> {
        self.tools
            .ytdlp
            .as_deref()
            .ok_or_else(|| LoaderError::ToolNotFound(YTDLP.to_string()).into())
    }

    fn ffmpeg_path(&self) -> Result<&Path> {
        self.tools
            .ffmpeg
            .as_deref()
            .ok_or_else(|| LoaderError::ToolNotFound(FFMPEG.to_string()).into())
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn check_ready(&self) -> Result<()> {
        let ffmpeg = self.ffmpeg_path()?;
        if !tools::probe(ffmpeg, "-version").await {
            return Err(anyhow!(
                "ffmpeg at {} did not respond to -version",
                ffmpeg.display()
            ));
        }

        let ytdlp = self.ytdlp_path()?;
        if !tools::probe(ytdlp, "--version").await {
            return Err(anyhow!(
                "yt-dlp at {} did not respond to --version",
                ytdlp.display()
            ));
        }
        Ok(())
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf> {
        let ytdlp = self.ytdlp_path()?;
        tokio::fs::create_dir_all(&request.destination)
            .await
            .with_context(|| format!("Failed to create {}", request.destination.display()))?;

        let args = build_args(request, self.tools.ffmpeg.as_deref(), &self.audio_quality);
        info!(
            "Job {}: fetching {} as {} ({})",
            request.job_id, request.source, request.format, request.kind
        );
        debug!("Running {:?} {:?}", ytdlp, args);

        let mut child = Command::new(ytdlp)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to launch yt-dlp at {}", ytdlp.display()))?;

        let stdout = child.stdout.take().context("yt-dlp stdout not captured")?;
        let stderr = child.stderr.take().context("yt-dlp stderr not captured")?;

        // Drain stderr concurrently so a chatty process can't block on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        let output_file = match scan_output(stdout, &progress).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Lost yt-dlp output for job {}: {}", request.job_id, e);
                let _ = child.start_kill();
                None
            }
        };

        let status = child.wait().await;
        let stderr_text = stderr_task.await.unwrap_or_default();
        let status = status?;

        if !status.success() {
            let reason = last_line(&stderr_text);
            error!("yt-dlp failed for job {}: {}", request.job_id, reason);
            return Err(LoaderError::JobFailed(reason).into());
        }

        let output_file = output_file.ok_or_else(|| {
            LoaderError::JobFailed("yt-dlp did not report an output file".to_string())
        })?;

        if !request.trim.is_empty() {
            trim_in_place(self.ffmpeg_path()?, &output_file, &request.trim).await?;
        }

        Ok(output_file)
    }
}

/// Forward progress lines and return the reported output file.
///
/// Lines are decoded lossily; titles are not guaranteed to be UTF-8.
async fn scan_output<R>(
    output: R,
    progress: &mpsc::Sender<TransferProgress>,
) -> std::io::Result<Option<PathBuf>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(output);
    let mut buf = Vec::new();
    let mut output_file = None;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(update) = parse_progress_line(&line) {
            let _ = progress.send(update).await;
        } else if let Some(path) = parse_file_line(&line) {
            output_file = Some(path);
        }
    }

    Ok(output_file)
}

/// Build the yt-dlp argument list for one request
pub fn build_args(
    request: &FetchRequest,
    ffmpeg: Option<&Path>,
    audio_quality: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--no-playlist".into(),
        "--no-warnings".into(),
        "--newline".into(),
        "--progress".into(),
        "--progress-template".into(),
        PROGRESS_TEMPLATE.into(),
        "--print".into(),
        FILE_TEMPLATE.into(),
        "-o".into(),
        request.destination.join(OUTPUT_TEMPLATE).into_os_string(),
    ];

    if let Some(ffmpeg) = ffmpeg {
        args.push("--ffmpeg-location".into());
        args.push(ffmpeg.into());
    }

    match request.kind {
        MediaKind::Audio => {
            args.extend([
                "-f".into(),
                "bestaudio/best".into(),
                "-x".into(),
                "--audio-format".into(),
                request.format.as_str().into(),
                "--audio-quality".into(),
                audio_quality.into(),
            ]);
        }
        MediaKind::Video => {
            let selector = format!(
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext={}]/best",
                request.format
            );
            args.extend([
                "-f".into(),
                selector.into(),
                "--merge-output-format".into(),
                request.format.as_str().into(),
            ]);
        }
    }

    args.push("--".into());
    args.push(request.source.as_str().into());
    args
}

/// Parse a `[progress] <downloaded> <total> <estimate>` line.
///
/// The estimate wins over the exact total when both are present; `NA`
/// fields are unknown.
pub fn parse_progress_line(line: &str) -> Option<TransferProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split_whitespace();

    let downloaded = parse_bytes(fields.next()?)?;
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);

    Some(TransferProgress::new(downloaded, estimate.or(total)))
}

/// Parse a `[file] <path>` line printed after yt-dlp moves the final file into place
pub fn parse_file_line(line: &str) -> Option<PathBuf> {
    let path = line.trim_end().strip_prefix(FILE_PREFIX)?.trim_start();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}
