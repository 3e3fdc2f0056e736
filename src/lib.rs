//! # stagebake
//!
//! Per-stage container options for layered image builds.
//!
//! Each build stage carries its own [`ContainerOptions`]. A stage inherits from
//! the stage before it, so the options of a whole ancestry chain are folded
//! root to leaf with [`ContainerOptions::resolve`]. The resolved set is then
//! encoded twice:
//!
//! - as run arguments for the transient container a stage is built in, and
//! - as commit changes that bake the configuration into the new image layer.
//!
//! Daemons older than 17.10 spell an empty `Cmd`/`Entrypoint` as `[]`, newer
//! ones as `[""]`. [`DaemonVersionProbe`] asks a [`VersionSource`] which one
//! applies.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagebake::{ContainerOptions, DaemonVersionProbe, StaticVersion};
//!
//! #[tokio::main]
//! async fn main() -> stagebake::Result<()> {
//!     let mut base = ContainerOptions::new();
//!     base.add_volume(["/cache"]);
//!     base.add_env([("A", "1")]);
//!
//!     let mut app = ContainerOptions::new().with_user("app");
//!     app.add_env([("B", "2")]);
//!
//!     let resolved = ContainerOptions::resolve([&base, &app]);
//!     println!("{:?}", resolved.to_run_args()?);
//!
//!     let probe = DaemonVersionProbe::new(StaticVersion::new("17.10.0"));
//!     println!("{:?}", resolved.commit_changes_with(&probe).await?);
//!     Ok(())
//! }
//! ```

/// Command line interface: argument parsing and project file discovery.
pub mod cli;

/// Typed model of the declarative build configuration tree.
pub mod config;

/// Daemon version probing and the Docker/Podman client.
pub mod daemon;

/// Path constants and helpers.
pub mod env;

pub mod error;

/// Git repositories backing git artifacts.
pub mod git;

/// Container options, their merge and their encodings.
pub mod options;

pub use config::Config;
pub use daemon::{DaemonVersionProbe, StaticVersion, VersionSource};
pub use error::{Result, StageError};
pub use options::{ContainerOptions, EmptyArrayStyle};

#[cfg(feature = "containers")]
pub use daemon::DaemonClient;
