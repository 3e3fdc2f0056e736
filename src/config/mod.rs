//! Declarative build configuration.
//!
//! The build configuration is a tree of dimgs (image descriptions), optionally
//! nested in groups. A dimg may build `from_dimg` another dimg; that chain is
//! the dimg's ancestry, and folding the Docker directives of the ancestry
//! yields the dimg's resolved [`ContainerOptions`].
//!
//! ```toml
//! [[dimg]]
//! name = "app"
//!
//! [dimg.docker]
//! workdir = "/app"
//! cmd = ["./server"]
//!
//! [dimg.from_dimg]
//! name = "base"
//!
//! [dimg.from_dimg.docker]
//! from = "ubuntu:22.04"
//! user = "app"
//! ```

mod tags;
mod types;

pub use tags::{NodeKind, TaggedNode};
pub use types::{
    Ansible, AnsibleTask, ArtifactBaseExport, ArtifactExport, ArtifactGroup, Dimg, DimgArtifact,
    DimgBase, DimgGroup, DockerArtifact, DockerBase, DockerDimg, GitArtifact, GitArtifactLocal,
    GitArtifactLocalExport, GitArtifactRemote, GitArtifactRemoteExport, Mount, ShellArtifact,
    ShellDimg, StageCommand, StageDependencies, Symbol,
};

use crate::error::{Result, StageError};
use crate::options::ContainerOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Root of the build configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub root: DimgGroup,
}

impl TaggedNode for Config {
    const KIND: NodeKind = NodeKind::Config;
}

impl Config {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// All top-level dimgs, walking nested groups depth-first.
    ///
    /// Ancestors reached through `from_dimg` are not listed.
    pub fn dimgs(&self) -> Vec<&Dimg> {
        let mut dimgs = Vec::new();
        collect_dimgs(&self.root, &mut dimgs);
        dimgs
    }

    /// Look up a top-level dimg by name.
    pub fn find_dimg(&self, name: &str) -> Result<&Dimg> {
        self.dimgs()
            .into_iter()
            .find(|dimg| dimg.base.name == name)
            .ok_or_else(|| StageError::NotFound(name.to_string()))
    }

    /// Check dimg names are unique and every ancestry resolves.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dimg in self.dimgs() {
            if !seen.insert(dimg.base.name.as_str()) {
                return Err(StageError::Config(format!(
                    "duplicate dimg name `{}`",
                    dimg.base.name
                )));
            }
            dimg.resolved_container_options()?;
        }
        Ok(())
    }
}

fn collect_dimgs<'a>(group: &'a DimgGroup, out: &mut Vec<&'a Dimg>) {
    out.extend(group.dimg.iter());
    for nested in &group.dimg_group {
        collect_dimgs(nested, out);
    }
}

impl Dimg {
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// The `from_dimg` chain ending with `self`, root first.
    pub fn ancestry(&self) -> Vec<&Dimg> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.base.from_dimg.as_deref() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Container options of this dimg with every ancestor folded in.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MergeInputInvalid`] if any stage has an unusable
    /// env or label key.
    pub fn resolved_container_options(&self) -> Result<ContainerOptions> {
        let stages = self
            .ancestry()
            .into_iter()
            .map(|dimg| dimg.docker.container_options())
            .collect::<Result<Vec<_>>>()?;
        Ok(ContainerOptions::resolve(&stages))
    }
}
