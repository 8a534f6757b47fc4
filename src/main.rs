//! medialoader - batch audio/video downloader
//!
//! Queues one download per URL, runs them one after another through yt-dlp
//! (with ffmpeg for conversion and trimming) and saves the results to the
//! last used destination folder.

use anyhow::{Context, Result};
use clap::Parser;
use medialoader::app::{App, OutputMode};
use medialoader::downloader::ytdlp::DEFAULT_AUDIO_QUALITY;
use medialoader::downloader::YtDlpFetcher;
use medialoader::queue::{JobOptions, MediaFormat, MediaKind, TrimRange};
use medialoader::utils::SettingsFile;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(version, about = "Download audio or video from a list of URLs")]
struct Args {
    /// URLs to download
    urls: Vec<String>,

    /// Read URLs from a file, one per line ("-" for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Download audio or video
    #[arg(short, long, default_value = "audio")]
    kind: MediaKind,

    /// Output format (audio: mp3, wav, m4a; video: mp4, mkv, webm)
    #[arg(short, long)]
    format: Option<MediaFormat>,

    /// Trim start offset, e.g. 00:01:30
    #[arg(long)]
    start: Option<String>,

    /// Trim end offset, e.g. 00:02:45
    #[arg(long)]
    end: Option<String>,

    /// Destination folder (remembered for next time)
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Audio bitrate for extracted audio
    #[arg(long, default_value = DEFAULT_AUDIO_QUALITY)]
    audio_quality: String,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print run events as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the run output (JSON lines with --json)
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let settings_file = args
        .config
        .clone()
        .map(SettingsFile::new)
        .unwrap_or_else(SettingsFile::at_default_location);

    let fetcher = YtDlpFetcher::new().with_audio_quality(args.audio_quality.clone());
    let mut app = App::new(settings_file, Arc::new(fetcher));

    if let Some(dest) = &args.dest {
        app.set_destination(dest)?;
    }

    let text = collect_input(&args)?;
    if text.trim().is_empty() {
        println!(
            "Nothing to download. Saving to {}",
            app.settings().destination.display()
        );
        return Ok(());
    }

    let options = JobOptions {
        kind: args.kind,
        format: args.format,
        trim: TrimRange::new(args.start.as_deref(), args.end.as_deref()),
    };
    app.submit(&text, &options).await?;

    let mode = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let mut stdout = std::io::stdout();
    let summary = app.run_queue(&mut stdout, mode).await?;

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// URLs from the command line followed by those from `--input`, newline separated
fn collect_input(args: &Args) -> Result<String> {
    let mut text = args.urls.join("\n");

    if let Some(input) = &args.input {
        let contents = if input.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read URLs from stdin")?;
            buf
        } else {
            std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read {}", input.display()))?
        };
        text.push('\n');
        text.push_str(&contents);
    }

    Ok(text)
}
