//! Command line argument parsing
//!
//! Subcommands:
//! - `run-args`: Print the run arguments of a dimg's resolved options
//! - `commit-changes`: Print the commit changes of a dimg's resolved options
//! - `probe`: Show the daemon version and its empty-array style
//! - `commits`: Resolve the latest commit of every git artifact of a dimg
//! - `show-config`: Show project file discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    Encode(EncodeConfig),
    Probe(ProbeConfig),
    Commits(CommitsConfig),
    ShowConfig,
}

/// Which encoding to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    RunArgs,
    CommitChanges,
}

#[derive(Debug)]
pub struct EncodeConfig {
    pub dimg: String,
    pub target: EncodeTarget,
    pub config_override: Option<PathBuf>,
    pub daemon_version: Option<String>,
    pub json: bool,
}

#[derive(Debug)]
pub struct ProbeConfig {
    pub config_override: Option<PathBuf>,
    pub daemon_version: Option<String>,
}

#[derive(Debug)]
pub struct CommitsConfig {
    pub dimg: String,
    pub config_override: Option<PathBuf>,
    pub project_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(name = "stagebake")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve per-stage container options and encode them for run or commit")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print run arguments for a transient build container
    RunArgs {
        /// Dimg name
        dimg: String,
        /// Project file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Print a JSON array instead of one token per line
        #[arg(long = "json")]
        json: bool,
    },
    /// Print commit changes for baking a new image layer
    CommitChanges {
        /// Dimg name
        dimg: String,
        /// Project file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Use this daemon version instead of asking the daemon
        #[arg(long = "daemon-version", value_name = "VERSION")]
        daemon_version: Option<String>,
        /// Print a JSON array instead of one instruction per line
        #[arg(long = "json")]
        json: bool,
    },
    /// Show the daemon version and its empty-array style
    Probe {
        /// Project file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Use this daemon version instead of asking the daemon
        #[arg(long = "daemon-version", value_name = "VERSION")]
        daemon_version: Option<String>,
    },
    /// Resolve the latest commit of every git artifact of a dimg
    Commits {
        /// Dimg name
        dimg: String,
        /// Project file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Directory holding the local repository
        #[arg(short = 'p', long = "project-dir")]
        project_dir: Option<PathBuf>,
    },
    /// Show project file discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::RunArgs { dimg, config, json }) => {
                Ok(ExecutionMode::Encode(EncodeConfig {
                    dimg: dimg.clone(),
                    target: EncodeTarget::RunArgs,
                    config_override: config.clone(),
                    daemon_version: None,
                    json: *json,
                }))
            }
            Some(Commands::CommitChanges {
                dimg,
                config,
                daemon_version,
                json,
            }) => Ok(ExecutionMode::Encode(EncodeConfig {
                dimg: dimg.clone(),
                target: EncodeTarget::CommitChanges,
                config_override: config.clone(),
                daemon_version: daemon_version.clone(),
                json: *json,
            })),
            Some(Commands::Probe {
                config,
                daemon_version,
            }) => Ok(ExecutionMode::Probe(ProbeConfig {
                config_override: config.clone(),
                daemon_version: daemon_version.clone(),
            })),
            Some(Commands::Commits {
                dimg,
                config,
                project_dir,
            }) => Ok(ExecutionMode::Commits(CommitsConfig {
                dimg: dimg.clone(),
                config_override: config.clone(),
                project_dir: project_dir.clone(),
            })),
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            None => Err(
                "No command specified. Use 'stagebake --help' to see available commands."
                    .to_string(),
            ),
        }
    }
}
