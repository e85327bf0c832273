//! Listing republication and object store mirroring.

use std::sync::Arc;

use manifest_sync::publish::IndexUpdate;
use manifest_sync::sync::{BranchOrder, ListingPublisher};
use pretty_assertions::assert_eq;

use crate::common::{MockHost, MockIndex, MockStore};

#[tokio::test]
async fn every_numeric_branch_gets_its_listing_published() {
    let host = Arc::new(MockHost::new());
    for name in ["4", "abc", "0", "730"] {
        host.add_branch(name);
    }
    host.add_file("4", "appmanifest_4.acf", b"four");
    host.add_file("730", "appmanifest_730.acf", b"cs");
    host.add_file("730", "config.vdf", b"cfg");

    let index = MockIndex::new();
    let publisher = ListingPublisher::<_, _, &MockStore>::new(
        host.clone(),
        &index,
        None,
        2,
        BranchOrder::Ascending,
    );
    let summary = publisher.run().await.unwrap();

    assert_eq!(summary.published, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.mirrored, 0);

    let mut published = index.published.lock().unwrap().clone();
    published.sort_by(|a, b| a.branch.cmp(&b.branch));
    assert_eq!(
        published,
        vec![
            IndexUpdate {
                branch: "4".to_string(),
                sha: "sha-4".to_string(),
                paths: vec!["appmanifest_4.acf".to_string()],
            },
            IndexUpdate {
                branch: "730".to_string(),
                sha: "sha-730".to_string(),
                paths: vec!["appmanifest_730.acf".to_string(), "config.vdf".to_string()],
            },
        ]
    );
}

#[tokio::test]
async fn republishing_is_idempotent() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");
    host.add_file("730", "appmanifest_730.acf", b"cs");

    let index = MockIndex::new();
    let publisher = ListingPublisher::<_, _, &MockStore>::new(
        host.clone(),
        &index,
        None,
        1,
        BranchOrder::Ascending,
    );
    publisher.run().await.unwrap();
    publisher.run().await.unwrap();

    let published = index.published.lock().unwrap();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0], published[1]);
}

#[tokio::test]
async fn mirror_uploads_every_listed_file() {
    let host = Arc::new(MockHost::new());
    host.add_branch("730");
    host.add_file("730", "appmanifest_730.acf", b"manifest bytes");
    host.add_file("730", "config.vdf", b"config bytes");

    let index = MockIndex::new();
    let store = MockStore::new();
    let publisher =
        ListingPublisher::new(host.clone(), &index, Some(&store), 1, BranchOrder::Ascending);
    let summary = publisher.run().await.unwrap();

    assert_eq!(summary.mirrored, 2);
    let objects = store.objects.lock().unwrap();
    assert_eq!(
        objects[&("730".to_string(), "appmanifest_730.acf".to_string())],
        b"manifest bytes".to_vec()
    );
    assert_eq!(
        objects[&("730".to_string(), "config.vdf".to_string())],
        b"config bytes".to_vec()
    );
}

#[tokio::test]
async fn one_failing_publication_does_not_abort_the_others() {
    let host = Arc::new(MockHost::new());
    host.add_branch("4");
    host.add_branch("730");
    host.add_file("4", "appmanifest_4.acf", b"four");
    host.add_file("730", "appmanifest_730.acf", b"cs");

    let index = MockIndex::new();
    index.fail_branch("4");

    let publisher = ListingPublisher::<_, _, &MockStore>::new(
        host.clone(),
        &index,
        None,
        2,
        BranchOrder::Ascending,
    );
    let summary = publisher.run().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.published, 1);
    assert_eq!(index.published.lock().unwrap()[0].branch, "730");
}
