use anyhow::{Context, Result};
use futures::future::join_all;
use stagebake::cli::{
    Args, CommitsConfig, ConfigDiscovery, EncodeConfig, EncodeTarget, ExecutionMode, ProbeConfig,
};
use stagebake::daemon::{self, DaemonClientConfig};
use stagebake::{ContainerOptions, DaemonVersionProbe, EmptyArrayStyle, StaticVersion, env};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match mode {
        ExecutionMode::Encode(config) => run_encode_mode(config).await,
        ExecutionMode::Probe(config) => run_probe_mode(config).await,
        ExecutionMode::Commits(config) => run_commits_mode(config).await,
        ExecutionMode::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
    }
}

async fn run_encode_mode(config: EncodeConfig) -> Result<()> {
    let project = ConfigDiscovery::load(config.config_override.as_deref())
        .context("Failed to load project file")?;
    let dimg = project.build.find_dimg(&config.dimg)?;
    let options = dimg
        .resolved_container_options()
        .with_context(|| format!("Failed to resolve options of dimg `{}`", config.dimg))?;
    debug!("Resolved options of {}: {:?}", config.dimg, options);

    let lines = match config.target {
        EncodeTarget::RunArgs => options.to_run_args()?,
        EncodeTarget::CommitChanges => {
            commit_changes(&options, config.daemon_version, &project.daemon).await?
        }
    };

    print_lines(&lines, config.json)
}

/// Commit changes, asking the daemon only when an empty array is written.
async fn commit_changes(
    options: &ContainerOptions,
    daemon_version: Option<String>,
    daemon_config: &DaemonClientConfig,
) -> Result<Vec<String>> {
    if let Some(version) = daemon_version {
        let probe = DaemonVersionProbe::new(StaticVersion::new(version));
        return Ok(options.commit_changes_with(&probe).await?);
    }

    if !options.needs_empty_array_style() {
        return Ok(options.to_commit_changes(EmptyArrayStyle::QuotedEmpty));
    }

    let style = daemon_style(daemon_config).await?;
    Ok(options.to_commit_changes(style))
}

#[cfg(feature = "containers")]
async fn daemon_style(daemon_config: &DaemonClientConfig) -> Result<EmptyArrayStyle> {
    let client = daemon::DaemonClient::with_config(daemon_config.clone())
        .await
        .context("Failed to connect to container daemon")?;
    Ok(DaemonVersionProbe::new(client).capability().await?)
}

#[cfg(not(feature = "containers"))]
async fn daemon_style(_daemon_config: &DaemonClientConfig) -> Result<EmptyArrayStyle> {
    anyhow::bail!("built without container support, pass --daemon-version")
}

async fn run_probe_mode(config: ProbeConfig) -> Result<()> {
    let reported = match config.daemon_version {
        Some(version) => version,
        None => {
            let daemon_config = match ConfigDiscovery::load(config.config_override.as_deref()) {
                Ok(project) => project.daemon,
                Err(e) if config.config_override.is_none() => {
                    warn!("Using default daemon settings: {}", e);
                    DaemonClientConfig::default()
                }
                Err(e) => return Err(e).context("Failed to load project file"),
            };
            reported_version(&daemon_config).await?
        }
    };

    let version = daemon::parse_daemon_version(&reported)?;
    let style = daemon::empty_array_style_of(&version);
    println!("Daemon version: {} ({})", reported, version);
    println!("Empty Cmd/Entrypoint: {}", style);
    Ok(())
}

#[cfg(feature = "containers")]
async fn reported_version(daemon_config: &DaemonClientConfig) -> Result<String> {
    let client = daemon::DaemonClient::with_config(daemon_config.clone())
        .await
        .context("Failed to connect to container daemon")?;
    Ok(client.server_version().await?)
}

#[cfg(not(feature = "containers"))]
async fn reported_version(_daemon_config: &DaemonClientConfig) -> Result<String> {
    anyhow::bail!("built without container support, pass --daemon-version")
}

async fn run_commits_mode(config: CommitsConfig) -> Result<()> {
    let project = ConfigDiscovery::load(config.config_override.as_deref())
        .context("Failed to load project file")?;
    let dimg = project.build.find_dimg(&config.dimg)?;

    let project_dir = match config.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let artifacts: Vec<_> = dimg
        .ancestry()
        .into_iter()
        .flat_map(|stage| stage.base.git_artifacts(&project_dir))
        .collect();
    if artifacts.is_empty() {
        info!("Dimg {} has no git artifacts", config.dimg);
        return Ok(());
    }

    let commits = join_all(artifacts.iter().map(|artifact| artifact.latest_commit())).await;
    for (artifact, commit) in artifacts.iter().zip(commits) {
        let commit = commit.with_context(|| {
            format!(
                "Failed to resolve commit of git artifact `{}`",
                artifact.name
            )
        })?;
        println!("{} {} {}", display_as(&artifact.as_name), artifact.name, commit);
    }
    Ok(())
}

fn display_as(as_name: &str) -> &str {
    if as_name.is_empty() { "-" } else { as_name }
}

fn print_lines(lines: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(lines)?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}

