//! Build configuration tree nodes.
//!
//! Shared field groups ([`DimgBase`], [`DockerBase`], [`ArtifactBaseExport`])
//! are embedded by value and flattened on the wire.

use super::tags::{NodeKind, TaggedNode};
use crate::error::Result;
use crate::options::ContainerOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Interned name, such as a builder or mount type.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(value.to_string())
    }
}

/// Named group of dimgs, possibly nested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimgGroup {
    pub dimg: Vec<Dimg>,
    pub dimg_group: Vec<DimgGroup>,
}

/// Image description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimg {
    #[serde(flatten)]
    pub base: DimgBase,
    pub docker: DockerDimg,
    pub shell: ShellDimg,
}

/// Image built only to export files into other images.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimgArtifact {
    #[serde(flatten)]
    pub base: DimgBase,
    pub docker: DockerArtifact,
    pub shell: ShellArtifact,
}

/// Fields shared by [`Dimg`] and [`DimgArtifact`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimgBase {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_dimg: Option<Box<Dimg>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_dimg_artifact: Option<Box<DimgArtifact>>,
    pub builder: Symbol,
    pub ansible: Ansible,
    pub artifact_group: Vec<ArtifactGroup>,
    pub git_artifact: GitArtifact,
    pub mount: Vec<Mount>,
}

/// Fields shared by [`DockerDimg`] and [`DockerArtifact`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerBase {
    pub from: String,
    pub from_cache_version: String,
}

/// Docker directives of a dimg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerDimg {
    #[serde(flatten)]
    pub base: DockerBase,
    pub volume: Vec<String>,
    pub expose: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub label: BTreeMap<String, String>,
    pub cmd: Vec<String>,
    pub onbuild: Vec<String>,
    pub workdir: String,
    pub user: String,
    pub entrypoint: Vec<String>,
}

impl DockerDimg {
    /// Container options contributed by this stage alone.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MergeInputInvalid`](crate::StageError::MergeInputInvalid)
    /// if an env or label key is unusable.
    pub fn container_options(&self) -> Result<ContainerOptions> {
        let mut options = ContainerOptions::new()
            .with_cmd(self.cmd.iter().cloned())
            .with_onbuild(self.onbuild.iter().cloned())
            .with_workdir(self.workdir.clone())
            .with_user(self.user.clone())
            .with_entrypoint(self.entrypoint.iter().cloned());
        options.add_volume(self.volume.iter().cloned());
        options.add_expose(self.expose.iter().cloned());
        options.add_env(self.env.clone());
        options.add_label(self.label.clone());
        options.validate()?;
        Ok(options)
    }
}

/// Docker directives of an artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerArtifact {
    #[serde(flatten)]
    pub base: DockerBase,
}

/// Shell builder stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellDimg {
    pub version: String,
    pub before_install: StageCommand,
    pub before_setup: StageCommand,
    pub install: StageCommand,
    pub setup: StageCommand,
}

/// Shell builder stages of an artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellArtifact {
    #[serde(flatten)]
    pub shell: ShellDimg,
    pub build_artifact: StageCommand,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageCommand {
    pub version: String,
    pub run: Vec<String>,
}

/// Ansible builder stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ansible {
    pub version: String,
    pub before_install_version: String,
    pub install_version: String,
    pub before_setup_version: String,
    pub setup_version: String,
    pub build_artifact_version: String,
    pub before_install: Vec<AnsibleTask>,
    pub install: Vec<AnsibleTask>,
    pub before_setup: Vec<AnsibleTask>,
    pub setup: Vec<AnsibleTask>,
    pub build_artifact: Vec<AnsibleTask>,
    pub dump_config_doc: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnsibleTask {
    pub config: toml::Table,
    pub dump_config_section: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactGroup {
    pub export: Vec<ArtifactExport>,
}

/// Files exported from an artifact into the current dimg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactExport {
    #[serde(flatten)]
    pub base: ArtifactBaseExport,
    pub config: DimgArtifact,
    pub before: Symbol,
    pub after: Symbol,
}

/// Fields shared by every export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactBaseExport {
    pub cwd: String,
    pub to: String,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub owner: String,
    pub group: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitArtifact {
    pub local: Vec<GitArtifactLocal>,
    pub remote: Vec<GitArtifactRemote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitArtifactLocal {
    #[serde(rename = "as")]
    pub as_name: String,
    pub export: Vec<GitArtifactLocalExport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitArtifactLocalExport {
    #[serde(flatten)]
    pub base: ArtifactBaseExport,
    pub stage_dependencies: StageDependencies,
}

/// Paths whose changes invalidate a given stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDependencies {
    pub install: Vec<String>,
    pub setup: Vec<String>,
    pub before_setup: Vec<String>,
    pub build_artifact: Vec<String>,
}

impl StageDependencies {
    /// Non-empty dependency lists keyed by stage name.
    pub fn by_stage(&self) -> BTreeMap<String, Vec<String>> {
        [
            ("install", &self.install),
            ("setup", &self.setup),
            ("before_setup", &self.before_setup),
            ("build_artifact", &self.build_artifact),
        ]
        .into_iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(stage, paths)| (stage.to_string(), paths.clone()))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitArtifactRemote {
    pub url: String,
    pub name: String,
    #[serde(rename = "as")]
    pub as_name: String,
    pub export: Vec<GitArtifactRemoteExport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitArtifactRemoteExport {
    #[serde(flatten)]
    pub export: GitArtifactLocalExport,
    pub branch: String,
    pub commit: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mount {
    pub to: String,
    pub from: String,
    #[serde(rename = "type")]
    pub mount_type: Symbol,
}

macro_rules! tagged_nodes {
    ($($node:ident),* $(,)?) => {
        $(
            impl TaggedNode for $node {
                const KIND: NodeKind = NodeKind::$node;
            }
        )*
    };
}

tagged_nodes!(
    DimgGroup,
    Dimg,
    DimgArtifact,
    DockerDimg,
    DockerArtifact,
    ShellDimg,
    ShellArtifact,
    StageCommand,
    ArtifactGroup,
    ArtifactExport,
    GitArtifact,
    GitArtifactLocal,
    GitArtifactLocalExport,
    StageDependencies,
    GitArtifactRemote,
    GitArtifactRemoteExport,
    Mount,
    Symbol,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;

    #[test]
    fn test_docker_dimg_container_options() {
        let mut docker = DockerDimg {
            volume: vec!["/data".to_string()],
            expose: vec!["80".to_string()],
            cmd: vec!["serve".to_string()],
            user: "app".to_string(),
            ..DockerDimg::default()
        };
        docker.env.insert("MODE".to_string(), "prod".to_string());

        let options = docker.container_options().unwrap();

        assert_eq!(options.volume, vec!["/data"]);
        assert_eq!(options.expose, vec!["80"]);
        assert_eq!(options.cmd, vec!["serve"]);
        assert_eq!(options.user, "app");
        assert_eq!(options.env["MODE"], "prod");
        assert!(options.volumes_from.is_empty());
    }

    #[test]
    fn test_docker_dimg_rejects_invalid_keys() {
        let mut docker = DockerDimg::default();
        docker.label.insert("bad=key".to_string(), "x".to_string());
        assert!(matches!(
            docker.container_options(),
            Err(StageError::MergeInputInvalid(_))
        ));
    }

    #[test]
    fn test_stage_dependencies_by_stage() {
        let deps = StageDependencies {
            install: vec!["Gemfile".to_string()],
            setup: vec!["config/**".to_string()],
            ..StageDependencies::default()
        };

        let by_stage = deps.by_stage();

        assert_eq!(by_stage.len(), 2);
        assert_eq!(by_stage["install"], vec!["Gemfile"]);
        assert!(!by_stage.contains_key("build_artifact"));
    }

    #[test]
    fn test_node_tags() {
        assert_eq!(Symbol::tag(), "!ruby/symbol");
        assert_eq!(
            DockerDimg::tag(),
            "!ruby/object:Dapp::Dimg::Config::Directive::Docker::Dimg"
        );
        assert_eq!(Mount::KIND, NodeKind::Mount);
    }
}
