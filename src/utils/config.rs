//! Application configuration

use crate::utils::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Key under which the last used destination is stored
pub const DESTINATION_KEY: &str = "destination";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Folder downloads are written to
    pub destination: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            destination: paths::current_dir(),
        }
    }
}

/// Plain-text settings file holding the last used destination.
///
/// The file contains `destination=<path>` lines; unknown keys are ignored.
/// A file holding nothing but a bare path is read as the destination too.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file at the platform config location
    pub fn at_default_location() -> Self {
        Self::new(paths::get_config_file_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings with the stored destination applied
    pub fn load(&self) -> AppSettings {
        AppSettings {
            destination: self.load_destination(),
        }
    }

    /// Last used destination, or the working directory if none is stored
    /// or the stored one is no longer a directory
    pub fn load_destination(&self) -> PathBuf {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No settings at {}: {}", self.path.display(), e);
                return paths::current_dir();
            }
        };

        match parse_destination(&contents) {
            Some(dir) if dir.is_dir() => dir,
            Some(dir) => {
                warn!(
                    "Saved destination {} is not a directory, using working directory",
                    dir.display()
                );
                paths::current_dir()
            }
            None => paths::current_dir(),
        }
    }

    /// Persist `destination` as the last used folder
    pub fn save_destination(&self, destination: &Path) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let destination = paths::absolute(destination);
        std::fs::write(
            &self.path,
            format!("{}={}\n", DESTINATION_KEY, destination.display()),
        )
        .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;

        info!("Saved destination {}", destination.display());
        Ok(())
    }
}

/// Pull the destination out of a settings file's contents
pub fn parse_destination(contents: &str) -> Option<PathBuf> {
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

    for line in lines.clone() {
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == DESTINATION_KEY {
                let value = value.trim();
                return (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }
    }

    // Legacy format: the whole file is one path
    match (lines.next(), lines.next()) {
        (Some(only), None) if !only.contains('=') => Some(PathBuf::from(only)),
        _ => None,
    }
}
