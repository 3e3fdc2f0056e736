//! Git repositories backing git artifacts.
//!
//! A [`GitArtifact`] pins a subtree of a local or remote repository. Its
//! latest commit is what a stage cache key would be derived from.

use crate::config::{DimgBase, GitArtifactLocalExport, GitArtifactRemote, GitArtifactRemoteExport};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Git errors.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Artifact has neither a local nor a remote repository
    #[error("GitRepo not initialized")]
    RepoNotInitialized,

    /// Git command failed
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Reference does not exist
    #[error("reference `{0}` not found")]
    RefNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A repository that can resolve branches to commits.
#[async_trait]
pub trait GitRepo: Send + Sync {
    fn name(&self) -> &str;

    /// Commit hash at the tip of `branch`.
    async fn latest_commit(&self, branch: &str) -> Result<String, GitError>;
}

/// Repository checked out on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalGitRepo {
    pub name: String,
    pub path: PathBuf,
}

impl LocalGitRepo {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl GitRepo for LocalGitRepo {
    fn name(&self) -> &str {
        &self.name
    }

    async fn latest_commit(&self, branch: &str) -> Result<String, GitError> {
        let reference = branch_ref(branch);
        debug!("Resolving {} in {:?}", reference, self.path);

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .arg("rev-parse")
            .arg("--verify")
            .arg(format!("{}^{{commit}}", reference))
            .output()
            .await?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: "rev-parse".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if commit.is_empty() {
            return Err(GitError::RefNotFound(reference));
        }
        Ok(commit)
    }
}

/// Repository reachable by URL.
#[derive(Debug, Clone)]
pub struct RemoteGitRepo {
    pub name: String,
    pub url: String,
}

impl RemoteGitRepo {
    pub fn new<S: Into<String>, U: Into<String>>(name: S, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl GitRepo for RemoteGitRepo {
    fn name(&self) -> &str {
        &self.name
    }

    async fn latest_commit(&self, branch: &str) -> Result<String, GitError> {
        let reference = branch_ref(branch);
        debug!("Resolving {} at {}", reference, self.url);

        let output = Command::new("git")
            .arg("ls-remote")
            .arg(&self.url)
            .arg(&reference)
            .output()
            .await?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: "ls-remote".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_ls_remote(&String::from_utf8_lossy(&output.stdout), &reference)
            .ok_or_else(|| GitError::RefNotFound(reference))
    }
}

/// Fully qualified ref of `branch`; an empty branch means `HEAD`.
///
/// Short names are ambiguous: `main` also matches tags and other branches
/// ending in `/main`.
fn branch_ref(branch: &str) -> String {
    if branch.is_empty() {
        "HEAD".to_string()
    } else {
        format!("refs/heads/{}", branch)
    }
}

/// Hash of the line for exactly `reference` in `git ls-remote` output.
fn parse_ls_remote(output: &str, reference: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(hash), Some(name)) if name == reference => Some(hash.to_string()),
            _ => None,
        }
    })
}

/// Repository location of a git artifact.
#[derive(Debug, Clone)]
pub enum GitRepoSource {
    Local(LocalGitRepo),
    Remote(RemoteGitRepo),
}

/// A pinned, filtered view of a repository used by a dimg.
#[derive(Debug, Clone, Default)]
pub struct GitArtifact {
    pub repo: Option<GitRepoSource>,
    pub name: String,
    pub as_name: String,
    pub branch: String,
    pub commit: String,
    pub cwd: String,
    pub owner: String,
    pub group: String,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub stages_dependencies: BTreeMap<String, Vec<String>>,
    pub params_hash: String,
}

impl GitArtifact {
    /// Artifact exported from the local repository at `path`.
    pub fn from_local_export<P: Into<PathBuf>>(
        name: &str,
        path: P,
        as_name: &str,
        export: &GitArtifactLocalExport,
    ) -> Self {
        Self {
            repo: Some(GitRepoSource::Local(LocalGitRepo::new(name, path))),
            name: name.to_string(),
            as_name: as_name.to_string(),
            cwd: export.base.cwd.clone(),
            owner: export.base.owner.clone(),
            group: export.base.group.clone(),
            include_paths: export.base.include_paths.clone(),
            exclude_paths: export.base.exclude_paths.clone(),
            stages_dependencies: export.stage_dependencies.by_stage(),
            ..Self::default()
        }
    }

    /// Artifact exported from a remote repository.
    pub fn from_remote_export(remote: &GitArtifactRemote, export: &GitArtifactRemoteExport) -> Self {
        let name = if remote.name.is_empty() {
            remote.url.clone()
        } else {
            remote.name.clone()
        };
        let base = &export.export.base;
        Self {
            repo: Some(GitRepoSource::Remote(RemoteGitRepo::new(
                name.clone(),
                remote.url.clone(),
            ))),
            name,
            as_name: remote.as_name.clone(),
            branch: export.branch.clone(),
            commit: export.commit.clone(),
            cwd: base.cwd.clone(),
            owner: base.owner.clone(),
            group: base.group.clone(),
            include_paths: base.include_paths.clone(),
            exclude_paths: base.exclude_paths.clone(),
            stages_dependencies: export.export.stage_dependencies.by_stage(),
            params_hash: String::new(),
        }
    }

    /// The backing repository.
    pub fn git_repo(&self) -> Result<&dyn GitRepo, GitError> {
        match &self.repo {
            Some(GitRepoSource::Local(repo)) => Ok(repo),
            Some(GitRepoSource::Remote(repo)) => Ok(repo),
            None => Err(GitError::RepoNotInitialized),
        }
    }

    /// Commit this artifact is built from.
    ///
    /// A pinned `commit` wins; otherwise the tip of `branch` is resolved.
    pub async fn latest_commit(&self) -> Result<String, GitError> {
        if !self.commit.is_empty() {
            return Ok(self.commit.clone());
        }
        self.git_repo()?.latest_commit(&self.branch).await
    }
}

/// Name of the repository holding the project itself.
pub const LOCAL_REPO_NAME: &str = "own";

impl DimgBase {
    /// Every git artifact export of this dimg, local ones rooted at `project_dir`.
    pub fn git_artifacts(&self, project_dir: &Path) -> Vec<GitArtifact> {
        let local = self.git_artifact.local.iter().flat_map(|local| {
            local.export.iter().map(move |export| {
                GitArtifact::from_local_export(LOCAL_REPO_NAME, project_dir, &local.as_name, export)
            })
        });
        let remote = self.git_artifact.remote.iter().flat_map(|remote| {
            remote
                .export
                .iter()
                .map(move |export| GitArtifact::from_remote_export(remote, export))
        });
        local.chain(remote).collect()
    }
}
