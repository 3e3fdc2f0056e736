//! Per-stage container options.
//!
//! A [`ContainerOptions`] value holds the container configuration contributed by
//! one build stage. Stages inherit from their ancestors, so the options of a
//! stage are resolved by folding [`ContainerOptions::merge`] over the ancestry
//! chain, root first. The resolved set is then encoded either as run arguments
//! for a transient build container or as commit changes for a new image layer
//! (see [`encode`]).
//!
//! ## Merge rules
//!
//! | Field | Rule |
//! |---|---|
//! | `volume`, `volumes_from`, `expose` | append, parent then child |
//! | `env`, `label` | union, child wins on key collision |
//! | `cmd`, `onbuild`, `workdir`, `user`, `entrypoint` | child replaces parent when non-empty |
//!
//! A child holding an empty value never clears the parent's value.

pub mod encode;

pub use encode::EmptyArrayStyle;

use crate::error::{Result, StageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Container configuration of a single build stage.
///
/// Mapping fields are ordered by key, so every encoding of a resolved set is
/// reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContainerOptions {
    pub volume: Vec<String>,
    pub volumes_from: Vec<String>,
    pub expose: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub label: BTreeMap<String, String>,
    pub cmd: Vec<String>,
    pub onbuild: Vec<String>,
    pub workdir: String,
    pub user: String,
    pub entrypoint: Vec<String>,
}

impl ContainerOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append volumes.
    pub fn add_volume<I, S>(&mut self, volumes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volume.extend(volumes.into_iter().map(Into::into));
    }

    /// Append containers to mount volumes from.
    pub fn add_volumes_from<I, S>(&mut self, volumes_from: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volumes_from
            .extend(volumes_from.into_iter().map(Into::into));
    }

    /// Append exposed ports.
    pub fn add_expose<I, S>(&mut self, exposes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose.extend(exposes.into_iter().map(Into::into));
    }

    /// Insert environment variables, overwriting existing keys.
    pub fn add_env<I, K, V>(&mut self, envs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in envs {
            self.env.insert(key.into(), value.into());
        }
    }

    /// Insert labels, overwriting existing keys.
    pub fn add_label<I, K, V>(&mut self, labels: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in labels {
            self.label.insert(key.into(), value.into());
        }
    }

    /// Set the command.
    pub fn with_cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Set the onbuild triggers.
    pub fn with_onbuild<I, S>(mut self, onbuild: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.onbuild = onbuild.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    pub fn with_workdir<S: Into<String>>(mut self, workdir: S) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Set the user.
    pub fn with_user<S: Into<String>>(mut self, user: S) -> Self {
        self.user = user.into();
        self
    }

    /// Set the entrypoint.
    pub fn with_entrypoint<I, S>(mut self, entrypoint: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = entrypoint.into_iter().map(Into::into).collect();
        self
    }

    /// Overlay `child` onto `self`, returning the merged set.
    ///
    /// Neither input is modified. Sequences are concatenated, mappings are
    /// united with `child` winning collisions, and scalar-like fields take the
    /// child's value only when it is non-empty.
    pub fn merge(&self, child: &ContainerOptions) -> ContainerOptions {
        let mut env = self.env.clone();
        env.extend(child.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut label = self.label.clone();
        label.extend(child.label.iter().map(|(k, v)| (k.clone(), v.clone())));

        ContainerOptions {
            volume: concat(&self.volume, &child.volume),
            volumes_from: concat(&self.volumes_from, &child.volumes_from),
            expose: concat(&self.expose, &child.expose),
            env,
            label,
            cmd: replace_if_nonempty(&self.cmd, &child.cmd),
            onbuild: replace_if_nonempty(&self.onbuild, &child.onbuild),
            workdir: replace_if_nonempty(&self.workdir, &child.workdir),
            user: replace_if_nonempty(&self.user, &child.user),
            entrypoint: replace_if_nonempty(&self.entrypoint, &child.entrypoint),
        }
    }

    /// Resolve an ancestry chain, root first, current stage last.
    ///
    /// An empty chain resolves to an empty set.
    pub fn resolve<'a, I>(chain: I) -> ContainerOptions
    where
        I: IntoIterator<Item = &'a ContainerOptions>,
    {
        chain
            .into_iter()
            .fold(ContainerOptions::default(), |parent, child| {
                parent.merge(child)
            })
    }

    /// Check invariants that `KEY=VALUE` encodings rely on.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MergeInputInvalid`] if an env or label key is
    /// empty or contains `=`.
    pub fn validate(&self) -> Result<()> {
        for (kind, map) in [("env", &self.env), ("label", &self.label)] {
            for key in map.keys() {
                if key.is_empty() {
                    return Err(StageError::MergeInputInvalid(format!(
                        "{} key must not be empty",
                        kind
                    )));
                }
                if key.contains('=') {
                    return Err(StageError::MergeInputInvalid(format!(
                        "{} key `{}` must not contain '='",
                        kind, key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether the commit encoding needs the daemon's empty-array style.
    pub fn needs_empty_array_style(&self) -> bool {
        self.cmd.is_empty() || self.entrypoint.is_empty()
    }
}

fn concat(parent: &[String], child: &[String]) -> Vec<String> {
    parent.iter().chain(child).cloned().collect()
}

trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for Vec<String> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

fn replace_if_nonempty<T: IsEmpty + Clone>(parent: &T, child: &T) -> T {
    if child.is_empty_value() {
        parent.clone()
    } else {
        child.clone()
    }
}
