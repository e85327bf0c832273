//! Branch filtering and create/update/skip decisions.

use std::sync::Arc;

use manifest_sync::sync::{BranchOrder, BranchSynchronizer};
use tempfile::TempDir;

use crate::common::MockHost;

const MANIFEST_730: &[u8] = b"\"AppState\"\n{\n  \"appid\"  \"730\"\n}\n";
const MANIFEST_4: &[u8] = b"\"AppState\"\n{\n  \"appid\"  \"4\"\n}\n";

fn synchronizer(host: &Arc<MockHost>, dir: &TempDir) -> BranchSynchronizer<MockHost> {
    BranchSynchronizer::new(host.clone(), dir.path(), 2, BranchOrder::Ascending)
}

fn write_local(dir: &TempDir, app_id: u32, content: &[u8]) {
    std::fs::write(dir.path().join(format!("appmanifest_{app_id}.acf")), content).unwrap();
}

#[tokio::test]
async fn identical_content_issues_no_write() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");
    host.add_file("730", "appmanifest_730.acf", MANIFEST_730);

    let dir = TempDir::new().unwrap();
    write_local(&dir, 730, MANIFEST_730);

    let summary = synchronizer(&host, &dir).run(None).await.unwrap();

    assert_eq!(summary.unchanged, 1);
    assert!(host.calls_matching("create").is_empty());
    assert!(host.calls_matching("update").is_empty());
}

#[tokio::test]
async fn differing_content_issues_exactly_one_update() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");
    host.add_file("730", "appmanifest_730.acf", b"stale bytes");

    let dir = TempDir::new().unwrap();
    write_local(&dir, 730, MANIFEST_730);

    let summary = synchronizer(&host, &dir).run(None).await.unwrap();

    assert_eq!(summary.updated, 1);
    assert!(host.calls_matching("create").is_empty());
    let updates = host.calls_matching("update");
    assert_eq!(updates.len(), 1);
    // The update names the artifact and carries the prior blob sha
    assert!(updates[0].contains("appmanifest_730.acf@730"));
    assert!(updates[0].contains("sha=blob-730-appmanifest_730.acf"));

    // The branch now holds the local bytes
    let files = host.files.lock().unwrap();
    let stored = &files[&("730".to_string(), "appmanifest_730.acf".to_string())];
    assert_eq!(stored.content, MANIFEST_730);
}

#[tokio::test]
async fn missing_remote_file_issues_exactly_one_create() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");

    let dir = TempDir::new().unwrap();
    write_local(&dir, 730, MANIFEST_730);

    let summary = synchronizer(&host, &dir).run(None).await.unwrap();

    assert_eq!(summary.created, 1);
    assert!(host.calls_matching("update").is_empty());
    assert_eq!(host.calls_matching("create").len(), 1);
}

#[tokio::test]
async fn missing_local_artifact_is_skipped_without_probing() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");

    let dir = TempDir::new().unwrap();

    let summary = synchronizer(&host, &dir).run(None).await.unwrap();

    assert_eq!(summary.skipped_no_local, 1);
    assert!(host.calls_matching("get_file").is_empty());
}

#[tokio::test]
async fn requested_app_without_branch_is_skipped() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");

    let dir = TempDir::new().unwrap();
    write_local(&dir, 730, MANIFEST_730);
    write_local(&dir, 999, b"orphan");

    let summary = synchronizer(&host, &dir).run(Some(&[730, 999])).await.unwrap();

    assert_eq!(summary.skipped_no_branch, 1);
    assert_eq!(summary.created, 1);
    assert!(host.calls_matching("get_file appmanifest_999").is_empty());
}

#[tokio::test]
async fn only_positive_numeric_branches_are_targets() {
    let host = Arc::new(MockHost::new());
    for name in ["4", "abc", "0", "730", "main"] {
        host.add_branch(name);
    }

    let dir = TempDir::new().unwrap();
    write_local(&dir, 4, MANIFEST_4);
    write_local(&dir, 730, MANIFEST_730);

    let summary = synchronizer(&host, &dir).run(None).await.unwrap();

    // Only "4" and "730" qualify as application branches
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.created, 2);
    assert!(host.calls_matching("get_file appmanifest_0").is_empty());
}

#[tokio::test]
async fn one_failing_branch_does_not_abort_the_others() {
    let host = Arc::new(MockHost::new());
    host.add_branch("4");
    host.add_branch("730");
    host.poison_branch("4");

    let dir = TempDir::new().unwrap();
    write_local(&dir, 4, MANIFEST_4);
    write_local(&dir, 730, MANIFEST_730);

    let summary = synchronizer(&host, &dir).run(None).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.created, 1);
}

#[tokio::test]
async fn rate_limit_query_failure_aborts_the_pass() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");
    host.fail_rate_limit.store(true, std::sync::atomic::Ordering::SeqCst);

    let dir = TempDir::new().unwrap();
    let result = synchronizer(&host, &dir).run(None).await;
    assert!(result.is_err());
}
