//! Container daemon capability probing.
//!
//! Daemons older than 17.10 accept `[]` for an empty `Cmd`/`Entrypoint` commit
//! change, newer ones require `[""]`. The [`DaemonVersionProbe`] turns the
//! version reported by a [`VersionSource`] into an [`EmptyArrayStyle`].
//!
//! The probe does not cache: every [`DaemonVersionProbe::capability`] call asks
//! the source again. Callers encoding many stages against one daemon should
//! query once and pass the style to
//! [`ContainerOptions::to_commit_changes`](crate::options::ContainerOptions::to_commit_changes).

#[cfg(feature = "containers")]
mod client;

#[cfg(feature = "containers")]
pub use client::DaemonClient;

use crate::error::{Result, StageError};
use crate::options::EmptyArrayStyle;
use futures::future::BoxFuture;
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};

/// First daemon version that expects `[""]` for empty arrays.
pub const EMPTY_ARRAY_THRESHOLD: Version = Version::new(17, 10, 0);

/// Daemon communication errors.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Docker/Podman API error
    #[cfg(feature = "containers")]
    #[error("Container API error: {0}")]
    Api(#[from] bollard::errors::Error),

    /// Could not connect to any daemon
    #[error("Connection error: {0}")]
    Connection(String),

    /// Daemon answered without a version
    #[error("daemon did not report a version")]
    MissingVersion,
}

/// Daemon client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonClientConfig {
    /// Connection timeout in seconds
    pub timeout: u64,
    /// Explicit socket, e.g. `unix:///var/run/docker.sock`
    pub socket: Option<String>,
}

impl Default for DaemonClientConfig {
    fn default() -> Self {
        Self {
            timeout: 120,
            socket: None,
        }
    }
}

/// Something that can report the daemon's version string.
pub trait VersionSource: Send + Sync {
    /// Version string as reported by the daemon, e.g. `24.0.7` or `17.09.1-ce`.
    fn reported_version(&self) -> BoxFuture<'_, std::result::Result<String, DaemonError>>;
}

/// Fixed version, for offline encoding and tests.
#[derive(Debug, Clone)]
pub struct StaticVersion {
    version: String,
}

impl StaticVersion {
    pub fn new<S: Into<String>>(version: S) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl VersionSource for StaticVersion {
    fn reported_version(&self) -> BoxFuture<'_, std::result::Result<String, DaemonError>> {
        let version = self.version.clone();
        Box::pin(async move { Ok(version) })
    }
}

/// Resolves the empty-array style of a daemon.
#[derive(Debug, Clone)]
pub struct DaemonVersionProbe<S> {
    source: S,
}

impl<S: VersionSource> DaemonVersionProbe<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query the daemon and derive its empty-array style.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::CapabilityQueryFailed`] if the version cannot be
    /// reported or parsed.
    pub async fn capability(&self) -> Result<EmptyArrayStyle> {
        let reported = self
            .source
            .reported_version()
            .await
            .map_err(|e| StageError::CapabilityQueryFailed(e.to_string()))?;
        empty_array_style_for(&reported)
    }
}

/// Map a reported daemon version to its empty-array style.
///
/// # Errors
///
/// Returns [`StageError::CapabilityQueryFailed`] on a malformed version.
pub fn empty_array_style_for(reported: &str) -> Result<EmptyArrayStyle> {
    Ok(empty_array_style_of(&parse_daemon_version(reported)?))
}

/// Empty-array style of an already parsed daemon version.
pub fn empty_array_style_of(version: &Version) -> EmptyArrayStyle {
    if *version < EMPTY_ARRAY_THRESHOLD {
        EmptyArrayStyle::Bracketed
    } else {
        EmptyArrayStyle::QuotedEmpty
    }
}

/// Parse a daemon version string.
///
/// Daemon versions are looser than strict semver: `17.10`, `17.09.0-ce` and
/// `17.10.0ce` are all valid. Missing components default to zero, leading
/// zeros are accepted and a `+` suffix is ignored. A `-` suffix, or a suffix
/// starting with a letter right after the numbers, is a prerelease.
///
/// Any number of numeric components is accepted. Components past the third
/// are kept as build metadata. When one of them is non-zero the version
/// outranks every release sharing its first three components, so its
/// prerelease moves into the build metadata too.
///
/// # Errors
///
/// Returns [`StageError::CapabilityQueryFailed`] on a malformed version.
pub fn parse_daemon_version(reported: &str) -> Result<Version> {
    let malformed = |reason: &str| {
        StageError::CapabilityQueryFailed(format!(
            "malformed daemon version `{}`: {}",
            reported, reason
        ))
    };

    let trimmed = reported.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let without_build = trimmed.split('+').next().unwrap_or_default();
    let (core, suffix) = without_build.split_at(
        without_build
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(without_build.len()),
    );
    let pre = if suffix.is_empty() {
        None
    } else if let Some(pre) = suffix.strip_prefix('-') {
        Some(pre)
    } else if suffix.starts_with(|c: char| c.is_ascii_alphabetic()) {
        Some(suffix)
    } else {
        return Err(malformed("unexpected suffix"));
    };
    if pre == Some("") {
        return Err(malformed("empty prerelease"));
    }

    let mut segments = Vec::new();
    for part in core.split('.') {
        if part.is_empty() {
            return Err(malformed("expected numeric components"));
        }
        segments.push(
            part.parse::<u64>()
                .map_err(|_| malformed("component out of range"))?,
        );
    }

    let (head, extra) = segments.split_at(segments.len().min(3));
    let mut numbers = [0u64; 3];
    numbers[..head.len()].copy_from_slice(head);
    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);

    if extra.iter().any(|&segment| segment != 0) {
        let mut build: Vec<String> = extra.iter().map(u64::to_string).collect();
        build.extend(pre.map(str::to_string));
        version.build =
            BuildMetadata::new(&build.join(".")).map_err(|e| malformed(&e.to_string()))?;
    } else if let Some(pre) = pre {
        version.pre = Prerelease::new(pre).map_err(|e| malformed(&e.to_string()))?;
    }
    Ok(version)
}
