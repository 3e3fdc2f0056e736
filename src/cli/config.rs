//! Project file discovery and loading
//!
//! The project file is searched in this order:
//! 1. Current directory: ./stagebake.toml or ./.stagebake/config.toml
//! 2. User config: ~/.stagebake/config.toml
//! 3. System config: /etc/stagebake/config.toml

use crate::config::Config;
use crate::daemon::DaemonClientConfig;
use crate::env;
use crate::error::{Result, StageError};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Contents of a project file: daemon settings plus the build configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub daemon: DaemonClientConfig,
    #[serde(flatten)]
    pub build: Config,
}

impl ProjectFile {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let project: ProjectFile = toml::from_str(content)?;
        project.build.validate()?;
        Ok(project)
    }

    /// Serialize to TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Project file discovery
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load `override_path` if given, otherwise the first discovered file.
    pub fn load(override_path: Option<&Path>) -> Result<ProjectFile> {
        if let Some(path) = override_path {
            info!("Loading project file override: {:?}", path);
            return ProjectFile::from_toml_file(path);
        }

        match Self::find_config_file() {
            Some(path) => {
                info!("Loading project file: {:?}", path);
                ProjectFile::from_toml_file(path)
            }
            None => Err(StageError::NotFound(format!(
                "no {} found (see `stagebake show-config`)",
                env::PROJECT_FILE_NAME
            ))),
        }
    }

    /// Find the project file using the discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::get_config_candidates() {
            debug!("Checking for project file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found project file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No project file found in discovery hierarchy");
        None
    }

    /// Candidate paths in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(env::project_file_path(&current_dir));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from(env::SYSTEM_CONFIG_FILE));

        candidates
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show discovery information for debugging
    pub fn show_discovery_info() {
        println!("Project File Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.is_file() {
                "✓ EXISTS"
            } else if candidate.exists() {
                "✗ NOT A FILE"
            } else {
                "✗ NOT FOUND"
            };
            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active project file: {:?}", found),
            None => println!("Active project file: none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROJECT: &str = r#"
[daemon]
timeout = 30

[[dimg]]
name = "web"

[dimg.docker]
from = "nginx:1.25"
expose = ["80"]
"#;

    #[test]
    fn test_project_file_parsing() {
        let project = ProjectFile::from_toml_str(PROJECT).unwrap();
        assert_eq!(project.daemon.timeout, 30);
        assert!(project.daemon.socket.is_none());
        let web = project.build.find_dimg("web").unwrap();
        assert_eq!(web.docker.base.from, "nginx:1.25");
    }

    #[test]
    fn test_project_file_without_daemon_section() {
        let project = ProjectFile::from_toml_str("[[dimg]]\nname = \"a\"\n").unwrap();
        assert_eq!(project.daemon.timeout, 120);
        assert_eq!(project.build.dimgs().len(), 1);
    }

    #[test]
    fn test_load_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stagebake.toml");
        std::fs::write(&path, PROJECT).unwrap();

        let project = ConfigDiscovery::load(Some(&path)).unwrap();
        assert_eq!(project.build.dimgs().len(), 1);

        let reparsed = ProjectFile::from_toml_str(&project.to_toml_string().unwrap()).unwrap();
        assert_eq!(reparsed.daemon.timeout, 30);
    }

    #[test]
    fn test_load_missing_override() {
        let result = ConfigDiscovery::load(Some(Path::new("/nonexistent/stagebake.toml")));
        assert!(matches!(result, Err(StageError::Io(_))));
    }

    #[test]
    fn test_config_candidates() {
        let candidates = ConfigDiscovery::get_config_candidates();
        assert!(!candidates.is_empty());
        assert_eq!(candidates[0].file_name().unwrap(), "stagebake.toml");
    }
}
