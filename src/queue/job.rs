//! Job records held by the queue

use crate::utils::error::LoaderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque job identifier, unique for the lifetime of a queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What the user wants out of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Audio,
    Video,
}

impl MediaKind {
    /// Format used when none is picked explicitly
    pub fn default_format(self) -> MediaFormat {
        match self {
            MediaKind::Audio => MediaFormat::Mp3,
            MediaKind::Video => MediaFormat::Mp4,
        }
    }

    /// Formats selectable for this kind
    pub fn formats(self) -> &'static [MediaFormat] {
        match self {
            MediaKind::Audio => &[MediaFormat::Mp3, MediaFormat::Wav, MediaFormat::M4a],
            MediaKind::Video => &[MediaFormat::Mp4, MediaFormat::Mkv, MediaFormat::Webm],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            other => Err(LoaderError::Validation(format!("unknown media kind '{}'", other))),
        }
    }
}

/// Output container / codec token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp3,
    Wav,
    M4a,
    Mp4,
    Mkv,
    Webm,
}

impl MediaFormat {
    /// The kind this format belongs to
    pub fn kind(self) -> MediaKind {
        match self {
            MediaFormat::Mp3 | MediaFormat::Wav | MediaFormat::M4a => MediaKind::Audio,
            MediaFormat::Mp4 | MediaFormat::Mkv | MediaFormat::Webm => MediaKind::Video,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Wav => "wav",
            MediaFormat::M4a => "m4a",
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Mkv => "mkv",
            MediaFormat::Webm => "webm",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(MediaFormat::Mp3),
            "wav" => Ok(MediaFormat::Wav),
            "m4a" => Ok(MediaFormat::M4a),
            "mp4" => Ok(MediaFormat::Mp4),
            "mkv" => Ok(MediaFormat::Mkv),
            "webm" => Ok(MediaFormat::Webm),
            other => Err(LoaderError::Validation(format!("unknown format '{}'", other))),
        }
    }
}

/// Optional trim window. Offsets are free-form (e.g. `00:01:30` or `90`)
/// and only checked for presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TrimRange {
    /// Build a range, treating blank strings as absent
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: non_blank(start),
            end: non_blank(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Job status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Running {
        progress: u8,
    },
    Complete,
    Failed {
        reason: String,
    },
}

impl JobStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Pending)
    }

    /// Short label for display and error messages
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Running { .. } => "Running",
            JobStatus::Complete => "Complete",
            JobStatus::Failed { .. } => "Failed",
        }
    }

    /// Whether `next` is a legal forward step from this status.
    ///
    /// `Pending -> Running -> {Complete | Failed}`; `Running` may be repeated
    /// with a new progress value. Nothing leaves a terminal state.
    pub fn can_advance_to(&self, next: &JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Running { .. }) => true,
            (JobStatus::Running { .. }, JobStatus::Running { .. }) => true,
            (JobStatus::Running { .. }, JobStatus::Complete) => true,
            (JobStatus::Running { .. }, JobStatus::Failed { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running { progress } => write!(f, "Running ({}%)", progress),
            JobStatus::Failed { reason } => write!(f, "Failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Settings a submission applies to every line it contains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOptions {
    pub kind: MediaKind,
    /// Falls back to the kind's default when `None`
    pub format: Option<MediaFormat>,
    pub trim: TrimRange,
}

/// One requested download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub source: String,
    pub kind: MediaKind,
    pub format: MediaFormat,
    pub trim: TrimRange,
    pub status: JobStatus,
    pub added_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job.
    ///
    /// Fails when the source is blank or the format does not belong to `kind`.
    pub fn new(source: &str, options: &JobOptions) -> Result<Self, LoaderError> {
        let job = Self {
            id: JobId::new(),
            source: source.trim().to_string(),
            kind: options.kind,
            format: options.format.unwrap_or_else(|| options.kind.default_format()),
            trim: options.trim.clone(),
            status: JobStatus::Pending,
            added_at: Utc::now(),
        };
        job.validate()?;
        Ok(job)
    }

    /// Check the fields a submission or edit must satisfy
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.source.trim().is_empty() {
            return Err(LoaderError::Validation("source URL is empty".to_string()));
        }
        if self.format.kind() != self.kind {
            return Err(LoaderError::Validation(format!(
                "format '{}' is not a valid {} format",
                self.format, self.kind
            )));
        }
        Ok(())
    }
}

/// Field changes for a pending job. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub kind: Option<MediaKind>,
    pub format: Option<MediaFormat>,
    /// `Some(None)` clears the start offset
    pub trim_start: Option<Option<String>>,
    /// `Some(None)` clears the end offset
    pub trim_end: Option<Option<String>>,
}

impl JobPatch {
    /// Produce the patched copy of `job` without touching the original
    pub(crate) fn apply_to(&self, job: &Job) -> Result<Job, LoaderError> {
        let mut patched = job.clone();

        if let Some(kind) = self.kind {
            patched.kind = kind;
            if self.format.is_none() && patched.format.kind() != kind {
                patched.format = kind.default_format();
            }
        }
        if let Some(format) = self.format {
            patched.format = format;
        }
        if let Some(start) = &self.trim_start {
            patched.trim.start = non_blank(start.as_deref());
        }
        if let Some(end) = &self.trim_end {
            patched.trim.end = non_blank(end.as_deref());
        }

        patched.validate()?;
        Ok(patched)
    }
}
