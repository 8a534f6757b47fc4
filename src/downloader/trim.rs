//! ffmpeg trim pass applied to a finished download
//!
//! Runs the same way for audio and video: stream copy between the offsets
//! into a sibling temp file, then replace the original.

use crate::queue::job::TrimRange;
use crate::utils::error::LoaderError;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Build the ffmpeg argument list for trimming `input` into `output`
pub fn trim_args(input: &Path, output: &Path, trim: &TrimRange) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-nostdin".into(), "-y".into(), "-i".into(), input.into()];
    if let Some(start) = &trim.start {
        args.push("-ss".into());
        args.push(start.into());
    }
    if let Some(end) = &trim.end {
        args.push("-to".into());
        args.push(end.into());
    }
    args.push("-c".into());
    args.push("copy".into());
    args.push(output.into());
    args
}

/// Temp file next to `input`, keeping the extension so ffmpeg picks the same muxer
pub fn temp_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}.trimmed.{}", stem, ext.to_string_lossy()),
        None => format!("{}.trimmed", stem),
    };
    input.with_file_name(name)
}

/// Trim `input` in place. A no-op for an empty range.
pub async fn trim_in_place(ffmpeg: &Path, input: &Path, trim: &TrimRange) -> Result<()> {
    if trim.is_empty() {
        return Ok(());
    }

    let temp = temp_output_path(input);
    let args = trim_args(input, &temp, trim);
    debug!("Running {:?} {:?}", ffmpeg, args);

    let output = Command::new(ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to launch ffmpeg at {}", ffmpeg.display()))?;

    if !output.status.success() {
        let _ = tokio::fs::remove_file(&temp).await;
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LoaderError::JobFailed(format!("trim failed: {}", last_line(&stderr))).into());
    }

    tokio::fs::rename(&temp, input)
        .await
        .with_context(|| format!("Failed to replace {} with trimmed copy", input.display()))?;

    info!("Trimmed {}", input.display());
    Ok(())
}

/// Last non-empty line of a tool's stderr, where ffmpeg and yt-dlp put the actual error
pub(crate) fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}
