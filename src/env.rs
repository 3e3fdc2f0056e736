//! Path constants and helpers.
//!
//! Centralizes the file and directory names stagebake looks for.

use std::path::{Path, PathBuf};

/// Project file in the current directory
pub const PROJECT_FILE_NAME: &str = "stagebake.toml";

/// Hidden application directory name
pub const APP_DIR_NAME: &str = ".stagebake";

/// Configuration file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// System-wide configuration file
#[cfg(unix)]
pub const SYSTEM_CONFIG_FILE: &str = "/etc/stagebake/config.toml";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "stagebake=info";

/// Build the project file path in a directory
pub fn project_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(PROJECT_FILE_NAME)
}

/// Build the app directory path from a root
pub fn app_dir_path(root: &Path) -> PathBuf {
    root.join(APP_DIR_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    app_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}
