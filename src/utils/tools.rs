//! Discovery of the external binaries medialoader shells out to
//!
//! Search order for every tool:
//! 1. Next to the current executable (portable installs, development)
//! 2. System PATH
//! 3. Common installation paths (Homebrew, pip user installs, etc.)

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const YTDLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";

/// Resolved locations of the external tools
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    pub ytdlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

impl ToolPaths {
    /// Look up every tool once
    pub fn discover() -> Self {
        Self {
            ytdlp: find_tool(YTDLP),
            ffmpeg: find_tool(FFMPEG),
        }
    }
}

/// Find a tool by name
pub fn find_tool(name: &str) -> Option<PathBuf> {
    if let Some(local) = find_next_to_exe(name) {
        info!("✓ Using bundled {}: {:?}", name, local);
        return Some(local);
    }

    if let Ok(path) = which::which(name) {
        info!("✓ Using system {}: {:?}", name, path);
        return Some(path);
    }

    if let Some(common) = find_in_common_paths(name) {
        info!("✓ Using {} from common path: {:?}", name, common);
        return Some(common);
    }

    warn!("✗ {} not found anywhere!", name);
    None
}

fn find_next_to_exe(name: &str) -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;
    debug!("Checking {:?} for bundled {}", exe_dir, name);

    let candidate = exe_dir.join(executable_name(name));
    if candidate.is_file() && is_executable(&candidate) {
        return Some(candidate);
    }
    None
}

fn find_in_common_paths(name: &str) -> Option<PathBuf> {
    let mut dirs_to_check = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin"),
        // macOS Homebrew (Intel), manual installs
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/Library/Frameworks/Python.framework/Versions/Current/bin"),
    ];
    if let Some(home) = dirs::home_dir() {
        dirs_to_check.push(home.join(".local").join("bin"));
    }

    dirs_to_check
        .into_iter()
        .map(|dir| dir.join(executable_name(name)))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Check if a file is executable
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        match std::fs::metadata(path) {
            Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Run `<tool> <arg>` and report whether it exits successfully
pub async fn probe(path: &Path, arg: &str) -> bool {
    match Command::new(path)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("Probe of {:?} failed: {}", path, e);
            false
        }
    }
}
