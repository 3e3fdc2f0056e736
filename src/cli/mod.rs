//! CLI-specific functionality
//!
//! Argument parsing and project file discovery for the `stagebake` binary.

pub mod args;
pub mod config;

pub use args::{Args, CommitsConfig, EncodeConfig, EncodeTarget, ExecutionMode, ProbeConfig};
pub use config::{ConfigDiscovery, ProjectFile};
