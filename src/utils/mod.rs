//! Utility modules for error handling, configuration and external tools

pub mod config;
pub mod error;
pub mod paths;
pub mod tools;

// Re-export for convenience
pub use config::{AppSettings, SettingsFile};
pub use error::LoaderError;
pub use paths::{get_config_dir, get_config_file_path};
pub use tools::{find_tool, ToolPaths};
