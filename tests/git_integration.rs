use stagebake::git::{GitArtifact, GitError, GitRepo, GitRepoSource, LocalGitRepo, RemoteGitRepo};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=stagebake",
            "-c",
            "user.email=stagebake@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("Should run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

struct Fixture {
    dir: TempDir,
    main: String,
    feature: String,
}

/// Repository whose `main` branch is shadowed by `feature/main` and a `main` tag.
fn fixture() -> Fixture {
    let dir = TempDir::new().expect("Should create temporary directory");
    let path = dir.path();

    git(path, &["init", "-q"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(path, &["commit", "-q", "--allow-empty", "-m", "first"]);
    let main = git(path, &["rev-parse", "HEAD"]);

    git(path, &["checkout", "-q", "-b", "feature/main"]);
    git(path, &["commit", "-q", "--allow-empty", "-m", "second"]);
    let feature = git(path, &["rev-parse", "HEAD"]);
    git(path, &["tag", "main", &feature]);

    git(path, &["checkout", "-q", "main"]);

    Fixture { dir, main, feature }
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[tokio::test]
async fn test_local_repo_resolves_exact_branch() {
    let fixture = fixture();
    let repo = LocalGitRepo::new("own", fixture.dir.path());

    let commit = repo
        .latest_commit("main")
        .await
        .expect("Should resolve main");
    assert_eq!(commit, fixture.main);
    assert_ne!(commit, fixture.feature);

    assert_eq!(
        repo.latest_commit("feature/main")
            .await
            .expect("Should resolve feature/main"),
        fixture.feature
    );
    assert_eq!(
        repo.latest_commit("").await.expect("Should resolve HEAD"),
        fixture.main
    );
}

#[tokio::test]
async fn test_remote_repo_resolves_exact_branch() {
    let fixture = fixture();
    let repo = RemoteGitRepo::new("app", file_url(fixture.dir.path()));

    assert_eq!(
        repo.latest_commit("main").await.expect("Should resolve main"),
        fixture.main
    );
    assert_eq!(
        repo.latest_commit("feature/main")
            .await
            .expect("Should resolve feature/main"),
        fixture.feature
    );
    assert_eq!(
        repo.latest_commit("").await.expect("Should resolve HEAD"),
        fixture.main
    );
}

#[tokio::test]
async fn test_missing_branch() {
    let fixture = fixture();

    let remote = RemoteGitRepo::new("app", file_url(fixture.dir.path()));
    assert!(matches!(
        remote.latest_commit("develop").await,
        Err(GitError::RefNotFound(reference)) if reference == "refs/heads/develop"
    ));

    let local = LocalGitRepo::new("own", fixture.dir.path());
    assert!(matches!(
        local.latest_commit("develop").await,
        Err(GitError::CommandFailed { .. })
    ));
}

#[tokio::test]
async fn test_artifact_follows_branch() {
    let fixture = fixture();
    let artifact = GitArtifact {
        repo: Some(GitRepoSource::Remote(RemoteGitRepo::new(
            "app",
            file_url(fixture.dir.path()),
        ))),
        name: "app".to_string(),
        branch: "main".to_string(),
        ..GitArtifact::default()
    };

    assert_eq!(
        artifact
            .latest_commit()
            .await
            .expect("Should resolve artifact commit"),
        fixture.main
    );
}
