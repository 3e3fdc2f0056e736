use stagebake::cli::{ConfigDiscovery, ProjectFile};
use stagebake::config::{Config, NodeKind, TaggedNode};
use stagebake::{EmptyArrayStyle, StageError};
use tempfile::TempDir;

const PROJECT: &str = r#"
[daemon]
timeout = 15
socket = "unix:///var/run/docker.sock"

[[dimg]]
name = "api"

[dimg.docker]
user = "api"
cmd = ["./api"]
volume = ["/srv/api/log"]

[dimg.docker.label]
"com.example.tier" = "backend"

[dimg.from_dimg]
name = "ruby"

[dimg.from_dimg.docker]
from = "ruby:3.3"
volume = ["/bundle"]
expose = ["3000"]

[dimg.from_dimg.docker.env]
BUNDLE_PATH = "/bundle"

[[dimg.git_artifact.remote]]
url = "https://example.com/api.git"
as = "api"

[[dimg.git_artifact.remote.export]]
cwd = "/"
to = "/srv/api"
branch = "main"
commit = "9fceb02d0ae598e95dc970b74767f19372d61af8"
"#;

#[test]
fn test_project_file_roundtrip() {
    let temp_dir = TempDir::new().expect("Should create temporary directory");
    let path = temp_dir.path().join("stagebake.toml");
    std::fs::write(&path, PROJECT).expect("Should write project file");

    let project = ConfigDiscovery::load(Some(&path)).expect("Should load project file");
    assert_eq!(project.daemon.timeout, 15);
    assert_eq!(
        project.daemon.socket.as_deref(),
        Some("unix:///var/run/docker.sock")
    );

    let serialized = project.to_toml_string().expect("Should serialize project file");
    let reparsed = ProjectFile::from_toml_str(&serialized).expect("Should reparse project file");
    let api = reparsed.build.find_dimg("api").expect("Should find api");
    assert_eq!(api.ancestry().len(), 2);
    assert_eq!(
        api.base.git_artifact.remote[0].url,
        "https://example.com/api.git"
    );
    assert_eq!(api.base.git_artifact.remote[0].export[0].branch, "main");
}

#[test]
fn test_resolved_encodings_from_project_file() {
    let project = ProjectFile::from_toml_str(PROJECT).expect("Should parse project file");
    let api = project.build.find_dimg("api").expect("Should find api");
    let options = api
        .resolved_container_options()
        .expect("Should resolve options");

    assert_eq!(
        options.to_run_args().expect("Should encode run args"),
        vec![
            "--volume=/bundle",
            "--volume=/srv/api/log",
            "--env=BUNDLE_PATH=/bundle",
            "--label=com.example.tier=backend",
            "--user=api",
        ]
    );
    assert_eq!(
        options.to_commit_changes(EmptyArrayStyle::Bracketed),
        vec![
            "Volume /bundle",
            "Volume /srv/api/log",
            "Expose 3000",
            "ENV BUNDLE_PATH=/bundle",
            "Label com.example.tier=backend",
            "Cmd [\"./api\"]",
            "User api",
            "Entrypoint []",
        ]
    );
}

#[tokio::test]
async fn test_pinned_git_artifact_commit() {
    let project = ProjectFile::from_toml_str(PROJECT).expect("Should parse project file");
    let api = project.build.find_dimg("api").expect("Should find api");

    let artifacts = api.base.git_artifacts(std::path::Path::new("."));
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].as_name, "api");
    assert_eq!(
        artifacts[0]
            .latest_commit()
            .await
            .expect("Pinned commit should not touch the repository"),
        "9fceb02d0ae598e95dc970b74767f19372d61af8"
    );
}

#[test]
fn test_invalid_env_key_is_rejected_on_load() {
    let content = r#"
[[dimg]]
name = "broken"

[dimg.docker.env]
"A=B" = "1"
"#;
    assert!(matches!(
        ProjectFile::from_toml_str(content),
        Err(StageError::MergeInputInvalid(_))
    ));
}

#[test]
fn test_malformed_toml() {
    assert!(matches!(
        Config::from_toml_str("[[dimg]\nname = "),
        Err(StageError::Config(_))
    ));
}

#[test]
fn test_config_root_tag() {
    assert_eq!(Config::KIND, NodeKind::Config);
    assert_eq!(Config::tag(), NodeKind::Config.tag());
}
