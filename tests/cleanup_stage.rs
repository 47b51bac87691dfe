// tests/cleanup_stage.rs

use dockyard::docker::CleanupStage;
use dockyard_test_utils::fake_engine::FakeContainerEngine;
use dockyard_test_utils::init_tracing;

#[tokio::test]
async fn stale_images_are_removed_with_their_containers() {
    init_tracing();
    let engine = FakeContainerEngine::new()
        .with_image("sha-1", "demo:amd64")
        .with_image("sha-2", "other:1.0")
        .with_container("sha-1", "demo-web")
        .with_container("sha-2", "other-web");

    let report = CleanupStage::new(&engine)
        .run(["demo:amd64", "fresh:amd64"])
        .await;

    assert_eq!(report.images, vec!["demo:amd64"]);
    assert_eq!(report.containers, vec!["demo-web"]);
    assert_eq!(
        engine.calls(),
        vec!["stop demo-web", "rm demo-web", "rmi demo:amd64"]
    );
}

#[tokio::test]
async fn removal_failures_are_skipped() {
    init_tracing();
    let engine = FakeContainerEngine::new()
        .with_image("sha-1", "a:1")
        .with_image("sha-2", "b:1")
        .failing_removal("a:1");

    let report = CleanupStage::new(&engine).run(["a:1", "b:1"]).await;

    assert_eq!(report.images, vec!["b:1"]);
    assert_eq!(engine.calls_to("rmi"), vec!["rmi a:1", "rmi b:1"]);
}

#[tokio::test]
async fn containers_of_multi_tagged_image_are_removed_first() {
    init_tracing();
    let engine = FakeContainerEngine::new()
        .with_image("sha-1", "demo:amd64")
        .with_image("sha-1", "demo:latest")
        .with_container("sha-1", "demo-web");

    let report = CleanupStage::new(&engine).run(["demo:amd64"]).await;

    assert_eq!(report.containers, vec!["demo-web"]);
    assert_eq!(
        engine.calls(),
        vec!["stop demo-web", "rm demo-web", "rmi demo:amd64"]
    );
}

#[tokio::test]
async fn failed_container_listing_skips_cleanup() {
    init_tracing();
    let engine = FakeContainerEngine::new()
        .with_image("sha-1", "demo:amd64")
        .with_container("sha-1", "demo-web")
        .failing_container_listing();

    let report = CleanupStage::new(&engine).run(["demo:amd64"]).await;

    assert!(report.images.is_empty());
    assert!(report.containers.is_empty());
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn failed_image_listing_skips_cleanup() {
    init_tracing();
    let engine = FakeContainerEngine::new()
        .with_image("sha-1", "demo:amd64")
        .with_container("sha-1", "demo-web")
        .failing_image_listing();

    let report = CleanupStage::new(&engine).run(["demo:amd64"]).await;

    assert!(report.images.is_empty());
    assert!(engine.calls().is_empty());
}
