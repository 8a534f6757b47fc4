//! Locations medialoader reads from and writes to
//!
//! Everything resolves to absolute paths. A relative path would silently
//! point somewhere else when the binary is launched from a desktop shortcut
//! or a service manager, where the working directory is often `/`.

use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const APP_DIR_NAME: &str = "medialoader";
pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Per-user configuration directory, e.g. `~/.config/medialoader/`.
///
/// Falls back to the working directory when the platform has no config dir.
pub fn get_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR_NAME),
        None => {
            warn!("Could not determine config directory, using working directory");
            current_dir()
        }
    }
}

/// Default location of the settings file
pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE_NAME)
}

/// The process working directory, or `.` if it cannot be read
pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        warn!("Could not read working directory: {}", e);
        PathBuf::from(".")
    })
}

/// Resolve `path` against the working directory without touching the filesystem
pub fn absolute(path: &Path) -> PathBuf {
    match path.absolutize() {
        Ok(abs) => abs.into_owned(),
        Err(e) => {
            debug!("Could not absolutize {:?}: {}", path, e);
            path.to_path_buf()
        }
    }
}
