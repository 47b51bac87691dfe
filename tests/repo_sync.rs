// tests/repo_sync.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dockyard::git::{RepoSyncError, SyncRequest, resolve_tags, sync_all, sync_repository};
use dockyard::types::{Arch, ChangeResult};
use dockyard_test_utils::fake_vcs::FakeVersionControl;
use dockyard_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn missing_checkout_is_cloned_and_reports_unknown() -> TestResult {
    init_tracing();
    let vcs = FakeVersionControl::new();

    let changes = sync_repository(&vcs, "https://example.com/a.git", Path::new("/work/a")).await?;

    assert_eq!(changes, ChangeResult::Unknown);
    assert_eq!(vcs.calls(), vec!["clone /work/a"]);
    Ok(())
}

#[tokio::test]
async fn pull_reports_files_between_heads() -> TestResult {
    init_tracing();
    let vcs = FakeVersionControl::new().with_changes("/work/a", &["src/main.rs", "README.md"]);

    let changes = sync_repository(&vcs, "https://example.com/a.git", Path::new("/work/a")).await?;

    assert_eq!(changes, ChangeResult::files(["README.md", "src/main.rs"]));
    assert_eq!(vcs.calls(), vec!["pull /work/a"]);
    Ok(())
}

#[tokio::test]
async fn up_to_date_checkout_has_no_changes() -> TestResult {
    init_tracing();
    let vcs = FakeVersionControl::new().with_unchanged("/work/a");

    let changes = sync_repository(&vcs, "https://example.com/a.git", Path::new("/work/a")).await?;

    assert_eq!(changes, ChangeResult::unchanged());
    Ok(())
}

#[tokio::test]
async fn failed_pull_is_a_pull_error() {
    init_tracing();
    let vcs = FakeVersionControl::new().with_pull_failure("/work/a");

    let err = sync_repository(&vcs, "https://example.com/a.git", Path::new("/work/a"))
        .await
        .unwrap_err();

    assert!(matches!(err, RepoSyncError::Pull { .. }));
}

#[tokio::test]
async fn duplicate_urls_are_synced_once_into_the_first_dir() {
    init_tracing();
    let vcs = FakeVersionControl::new().with_changes("/work/a", &["x"]);
    let url = "https://example.com/a.git";

    let synced = sync_all(
        Arc::new(vcs.clone()),
        vec![
            SyncRequest::new(url, "/work/a"),
            SyncRequest::new(url, "/work/.triggers/a"),
        ],
    )
    .await;

    assert_eq!(synced.len(), 1);
    assert_eq!(synced.get(url).unwrap().dir, PathBuf::from("/work/a"));
    assert_eq!(vcs.calls(), vec!["pull /work/a"]);
}

#[tokio::test]
async fn one_failing_repository_does_not_stop_the_others() {
    init_tracing();
    let vcs = FakeVersionControl::new()
        .with_clone_failure("/work/broken")
        .with_unchanged("/work/ok");

    let synced = sync_all(
        Arc::new(vcs),
        vec![
            SyncRequest::new("https://example.com/broken.git", "/work/broken"),
            SyncRequest::new("https://example.com/ok.git", "/work/ok"),
        ],
    )
    .await;

    assert!(synced.get("https://example.com/broken.git").is_none());
    assert!(matches!(
        synced.failure("https://example.com/broken.git"),
        Some(RepoSyncError::Clone { .. })
    ));
    assert_eq!(
        synced.get("https://example.com/ok.git").unwrap().changes,
        ChangeResult::unchanged()
    );
}

#[tokio::test]
async fn tags_fall_back_to_empty_strings() {
    init_tracing();
    let vcs = FakeVersionControl::new()
        .with_unchanged("/work/tagged")
        .with_describe("/work/tagged", "0.7.1-1-gdc36179", "0.7.1")
        .with_unchanged("/work/untagged");

    let tagged = resolve_tags(&vcs, Path::new("/work/tagged"), Arch::Arm64v8).await;
    assert_eq!(tagged.arch, "arm64v8");
    assert_eq!(tagged.commit_short, "1111111");
    assert_eq!(tagged.tag, "0.7.1");
    assert_eq!(tagged.tag_full, "0.7.1-1-gdc36179");

    let untagged = resolve_tags(&vcs, Path::new("/work/untagged"), Arch::Amd64).await;
    assert_eq!(untagged.tag, "");
    assert_eq!(untagged.tag_full, "");
    assert_eq!(untagged.commit_full, "1111111111111111");
}
