//! Docker/Podman daemon client.
//!
//! Wraps the bollard Docker API with connection fallback and exposes the
//! daemon version as a [`VersionSource`].

use super::{DaemonClientConfig, DaemonError, VersionSource};
use bollard::Docker;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info};

/// Docker/Podman API client.
#[derive(Clone)]
pub struct DaemonClient {
    docker: Arc<Docker>,
    config: DaemonClientConfig,
}

impl DaemonClient {
    /// Connect with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if neither Docker nor Podman is reachable.
    pub async fn new() -> Result<Self, DaemonError> {
        Self::with_config(DaemonClientConfig::default()).await
    }

    /// Connect with a custom configuration and verify the connection.
    ///
    /// # Errors
    ///
    /// Returns error if connecting or pinging fails.
    pub async fn with_config(config: DaemonClientConfig) -> Result<Self, DaemonError> {
        let docker = Self::connect(&config)?;

        let client = Self {
            docker: Arc::new(docker),
            config,
        };

        client.ping().await?;

        Ok(client)
    }

    /// Connect to Docker or Podman.
    ///
    /// An explicit socket is used as-is. Otherwise tries, in order:
    /// 1. Local defaults (Unix socket, Windows named pipe, DOCKER_HOST)
    /// 2. Rootless Podman socket
    /// 3. System Podman socket
    fn connect(config: &DaemonClientConfig) -> Result<Docker, DaemonError> {
        if let Some(socket) = &config.socket {
            debug!("Connecting to configured socket: {}", socket);
            return Ok(Docker::connect_with_socket(
                socket,
                config.timeout,
                bollard::API_DEFAULT_VERSION,
            )?);
        }

        debug!("Attempting to connect to container daemon...");

        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container daemon via local defaults");
                return Ok(docker);
            }
            Err(e) => {
                debug!("Local defaults failed: {}", e);
            }
        }

        #[cfg(unix)]
        {
            let mut candidates = Vec::new();
            if let Ok(home) = std::env::var("HOME") {
                candidates.push(format!("unix://{}/run/podman/podman.sock", home));
            }
            candidates.push("unix:///run/podman/podman.sock".to_string());

            for socket in candidates {
                debug!("Trying Podman socket: {}", socket);
                match Docker::connect_with_socket(
                    &socket,
                    config.timeout,
                    bollard::API_DEFAULT_VERSION,
                ) {
                    Ok(docker) => {
                        info!("Connected to Podman via {}", socket);
                        return Ok(docker);
                    }
                    Err(e) => {
                        debug!("Podman socket {} failed: {}", socket, e);
                    }
                }
            }
        }

        Err(DaemonError::Connection(
            "Failed to connect to Docker or Podman. Please ensure a daemon is running."
                .to_string(),
        ))
    }

    /// Ping the daemon.
    ///
    /// # Errors
    ///
    /// Returns error if ping fails.
    pub async fn ping(&self) -> Result<(), DaemonError> {
        self.docker.ping().await?;
        debug!("Container daemon ping successful");
        Ok(())
    }

    /// Server version string, e.g. `24.0.7`.
    ///
    /// # Errors
    ///
    /// Returns error if the version query fails or carries no version.
    pub async fn server_version(&self) -> Result<String, DaemonError> {
        let version = self.docker.version().await?;
        let reported = version.version.ok_or(DaemonError::MissingVersion)?;
        debug!("Container daemon reports version {}", reported);
        Ok(reported)
    }

    pub fn config(&self) -> &DaemonClientConfig {
        &self.config
    }
}

impl VersionSource for DaemonClient {
    fn reported_version(&self) -> BoxFuture<'_, Result<String, DaemonError>> {
        Box::pin(self.server_version())
    }
}
