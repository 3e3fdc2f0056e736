//! Run-argument and commit-change encodings of resolved container options.

use super::ContainerOptions;
use crate::daemon::{DaemonVersionProbe, VersionSource};
use crate::error::{Result, StageError};

/// How the target daemon expects an empty `Cmd` or `Entrypoint` to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyArrayStyle {
    /// `[]`, understood by daemons older than 17.10
    Bracketed,
    /// `[""]`, required by 17.10 and newer
    QuotedEmpty,
}

impl EmptyArrayStyle {
    /// Literal token written after the instruction name.
    pub fn token(self) -> &'static str {
        match self {
            EmptyArrayStyle::Bracketed => "[]",
            EmptyArrayStyle::QuotedEmpty => "[\"\"]",
        }
    }
}

impl std::fmt::Display for EmptyArrayStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl ContainerOptions {
    /// Encode as flags for launching a transient build container.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnsupportedEntrypointArity`] if the entrypoint has
    /// more than one element.
    pub fn to_run_args(&self) -> Result<Vec<String>> {
        let mut args = Vec::new();

        for volume in &self.volume {
            args.push(format!("--volume={}", volume));
        }

        for volumes_from in &self.volumes_from {
            args.push(format!("--volumes-from={}", volumes_from));
        }

        for (key, value) in &self.env {
            args.push(format!("--env={}={}", key, value));
        }

        for (key, value) in &self.label {
            args.push(format!("--label={}={}", key, value));
        }

        if !self.user.is_empty() {
            args.push(format!("--user={}", self.user));
        }

        match self.entrypoint.as_slice() {
            [] => {}
            [entrypoint] => args.push(format!("--entrypoint={}", entrypoint)),
            _ => {
                return Err(StageError::UnsupportedEntrypointArity {
                    entrypoint: self.entrypoint.clone(),
                });
            }
        }

        Ok(args)
    }

    /// Encode as change instructions for committing a new image layer.
    ///
    /// `style` decides how an empty `Cmd` or `Entrypoint` is written.
    pub fn to_commit_changes(&self, style: EmptyArrayStyle) -> Vec<String> {
        let mut changes = Vec::new();

        for volume in &self.volume {
            changes.push(format!("Volume {}", volume));
        }

        for expose in &self.expose {
            changes.push(format!("Expose {}", expose));
        }

        for (key, value) in &self.env {
            changes.push(format!("ENV {}={}", key, value));
        }

        for (key, value) in &self.label {
            changes.push(format!("Label {}={}", key, value));
        }

        changes.push(format!("Cmd {}", exec_form(&self.cmd, style)));

        if !self.onbuild.is_empty() {
            changes.push(format!("Onbuild {}", self.onbuild.join(" ")));
        }

        if !self.workdir.is_empty() {
            changes.push(format!("Workdir {}", self.workdir));
        }

        if !self.user.is_empty() {
            changes.push(format!("User {}", self.user));
        }

        changes.push(format!("Entrypoint {}", exec_form(&self.entrypoint, style)));

        changes
    }

    /// Encode as commit changes, asking `probe` for the empty-array style.
    ///
    /// The daemon is queried at most once, and only if `Cmd` or `Entrypoint`
    /// is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::CapabilityQueryFailed`] if the daemon version
    /// cannot be reported or parsed.
    pub async fn commit_changes_with<S: VersionSource>(
        &self,
        probe: &DaemonVersionProbe<S>,
    ) -> Result<Vec<String>> {
        let style = if self.needs_empty_array_style() {
            probe.capability().await?
        } else {
            // Never written when both arrays are non-empty
            EmptyArrayStyle::QuotedEmpty
        };
        Ok(self.to_commit_changes(style))
    }
}

fn exec_form(values: &[String], style: EmptyArrayStyle) -> String {
    if values.is_empty() {
        style.token().to_string()
    } else {
        format!("[\"{}\"]", values.join("\", \""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::StaticVersion;

    fn scenario_options() -> ContainerOptions {
        let mut options = ContainerOptions::new().with_entrypoint(["/bin/sh"]);
        options.add_env([("A", "1")]);
        options
    }

    #[test]
    fn test_empty_array_tokens() {
        assert_eq!(EmptyArrayStyle::Bracketed.token(), "[]");
        assert_eq!(EmptyArrayStyle::QuotedEmpty.token(), "[\"\"]");
        assert_eq!(EmptyArrayStyle::QuotedEmpty.to_string(), "[\"\"]");
    }

    #[test]
    fn test_run_args_full() {
        let mut options = ContainerOptions::new()
            .with_user("app")
            .with_entrypoint(["/entrypoint.sh"]);
        options.add_volume(["/cache"]);
        options.add_volumes_from(["builder"]);
        options.add_env([("B", "2"), ("A", "1")]);
        options.add_label([("tier", "base")]);
        options.add_expose(["8080"]);

        let args = options.to_run_args().unwrap();

        assert_eq!(
            args,
            vec![
                "--volume=/cache",
                "--volumes-from=builder",
                "--env=A=1",
                "--env=B=2",
                "--label=tier=base",
                "--user=app",
                "--entrypoint=/entrypoint.sh",
            ]
        );
    }

    #[test]
    fn test_run_args_entrypoint_arity() {
        let empty = ContainerOptions::new();
        assert!(empty.to_run_args().unwrap().is_empty());

        let single = ContainerOptions::new().with_entrypoint(["/bin/sh"]);
        assert_eq!(single.to_run_args().unwrap(), vec!["--entrypoint=/bin/sh"]);

        let multi = ContainerOptions::new().with_entrypoint(["/bin/sh", "-c"]);
        match multi.to_run_args() {
            Err(StageError::UnsupportedEntrypointArity { entrypoint }) => {
                assert_eq!(entrypoint, vec!["/bin/sh", "-c"]);
            }
            other => panic!("Expected UnsupportedEntrypointArity, got {:?}", other),
        }
    }

    #[test]
    fn test_run_args_skip_expose_and_cmd() {
        let mut options = ContainerOptions::new().with_cmd(["true"]).with_workdir("/w");
        options.add_expose(["80"]);
        assert!(options.to_run_args().unwrap().is_empty());
    }

    #[test]
    fn test_commit_changes_pre_threshold_scenario() {
        let changes = scenario_options().to_commit_changes(EmptyArrayStyle::Bracketed);
        assert_eq!(
            changes,
            vec!["ENV A=1", "Cmd []", "Entrypoint [\"/bin/sh\"]"]
        );
    }

    #[test]
    fn test_commit_changes_post_threshold_scenario() {
        let changes = scenario_options().to_commit_changes(EmptyArrayStyle::QuotedEmpty);
        assert_eq!(
            changes,
            vec!["ENV A=1", "Cmd [\"\"]", "Entrypoint [\"/bin/sh\"]"]
        );
    }

    #[test]
    fn test_commit_changes_full_order() {
        let mut options = ContainerOptions::new()
            .with_cmd(["nginx", "-g", "daemon off;"])
            .with_onbuild(["RUN", "echo", "hi"])
            .with_workdir("/srv")
            .with_user("www-data")
            .with_entrypoint(["/docker-entrypoint.sh", "--"]);
        options.add_volume(["/var/log"]);
        options.add_volumes_from(["ignored"]);
        options.add_expose(["80/tcp"]);
        options.add_env([("PORT", "80")]);
        options.add_label([("app", "web")]);

        let changes = options.to_commit_changes(EmptyArrayStyle::Bracketed);

        assert_eq!(
            changes,
            vec![
                "Volume /var/log",
                "Expose 80/tcp",
                "ENV PORT=80",
                "Label app=web",
                "Cmd [\"nginx\", \"-g\", \"daemon off;\"]",
                "Onbuild RUN echo hi",
                "Workdir /srv",
                "User www-data",
                "Entrypoint [\"/docker-entrypoint.sh\", \"--\"]",
            ]
        );
    }

    #[tokio::test]
    async fn test_commit_changes_with_probe() {
        let old = DaemonVersionProbe::new(StaticVersion::new("17.09.1-ce"));
        let changes = scenario_options().commit_changes_with(&old).await.unwrap();
        assert_eq!(changes[1], "Cmd []");

        let new = DaemonVersionProbe::new(StaticVersion::new("24.0.7"));
        let changes = scenario_options().commit_changes_with(&new).await.unwrap();
        assert_eq!(changes[1], "Cmd [\"\"]");
    }

    #[tokio::test]
    async fn test_commit_changes_with_probe_failure_is_fatal() {
        let broken = DaemonVersionProbe::new(StaticVersion::new("not-a-version"));
        let result = scenario_options().commit_changes_with(&broken).await;
        assert!(matches!(result, Err(StageError::CapabilityQueryFailed(_))));
    }

    #[tokio::test]
    async fn test_commit_changes_with_skips_probe_when_not_needed() {
        // A malformed version would fail if it were ever queried
        let broken = DaemonVersionProbe::new(StaticVersion::new("garbage"));
        let options = ContainerOptions::new()
            .with_cmd(["run"])
            .with_entrypoint(["/init"]);

        let changes = options.commit_changes_with(&broken).await.unwrap();

        assert_eq!(changes, vec!["Cmd [\"run\"]", "Entrypoint [\"/init\"]"]);
    }
}
