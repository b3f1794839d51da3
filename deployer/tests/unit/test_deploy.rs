//! End-to-end deployment tests against an in-memory store

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use gdeploy::deploy::events::{ChannelObserver, DeployEvent};
use gdeploy::filesys::file::File;
use gdeploy::remote::local::LocalObjectStore;
use gdeploy::storage::settings::PublishRoots;
use gdeploy::{
    DeployError, Deployer, DeployerOptions, DeploymentParams, DeploymentRequest, PublishType,
    UploadError,
};

use crate::support::{write_tree, InstrumentedStore};

const BASE_URL: &str = "https://example.com/graphics";

struct Fixture {
    _dir: tempfile::TempDir,
    source: std::path::PathBuf,
    log_path: std::path::PathBuf,
}

fn fixture(files: &[(&str, &str)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("publish");
    std::fs::create_dir_all(&source).unwrap();
    write_tree(&source, files);
    Fixture {
        log_path: dir.path().join("config.json"),
        source,
        _dir: dir,
    }
}

fn options(log_path: &Path) -> DeployerOptions {
    DeployerOptions {
        log_file: File::new(log_path),
        publish_roots: PublishRoots {
            project: "graphics".to_string(),
            tileset: "tiles".to_string(),
        },
        max_concurrent_uploads: 4,
    }
}

fn request(source: &Path, artifact_id: &str, append_path: Option<&str>) -> DeploymentRequest {
    DeploymentRequest::new(DeploymentParams {
        source_dir: source.to_path_buf(),
        project: "demo".to_string(),
        artifact_id: artifact_id.to_string(),
        publish_type: PublishType::Project,
        public_base_url: BASE_URL.to_string(),
        append_path: append_path.map(str::to_string),
        ..Default::default()
    })
    .unwrap()
}

fn read_log(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_successful_deploy_records_artifact() {
    let fx = fixture(&[("a.png", "aaa"), ("b.png", "bb")]);
    let store = Arc::new(InstrumentedStore::new(Duration::from_millis(1)));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let report = deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.log_updated);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.total(), 2);
    assert_eq!(report.public_url, "https://example.com/graphics/demo/v1");
    assert_eq!(report.origin_url, "memory://bucket/graphics/demo/v1");

    assert_eq!(
        store.keys(),
        vec!["graphics/demo/v1/a.png", "graphics/demo/v1/b.png"]
    );
    assert_eq!(store.body("graphics/demo/v1/a.png").unwrap(), b"aaa");

    assert_eq!(
        read_log(&fx.log_path),
        json!({
            "published_project": {
                "demo": [{ "id": "v1", "url": "https://example.com/graphics/demo/v1" }]
            }
        })
    );
}

#[tokio::test]
async fn test_partial_failure_leaves_log_untouched() {
    let fx = fixture(&[("a.png", "aaa"), ("b.png", "bb")]);
    let original = "{\n    \"name\": \"demo\"\n}\n";
    std::fs::write(&fx.log_path, original).unwrap();

    let store = Arc::new(InstrumentedStore::new(Duration::ZERO).failing("b.png"));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let report = deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    assert!(!report.success);
    assert!(!report.log_updated);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("b.png"));
    assert!(matches!(report.failed[0].error, UploadError::Transport(_)));

    // Uploaded files stay in place
    assert_eq!(store.keys(), vec!["graphics/demo/v1/a.png"]);
    assert_eq!(std::fs::read_to_string(&fx.log_path).unwrap(), original);

    match report.into_result() {
        Err(DeployError::AggregateDeploymentFailure { failed }) => assert_eq!(failed.len(), 1),
        other => panic!("expected aggregate failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_new_record_is_appended_after_existing_ones() {
    let fx = fixture(&[("index.html", "<html>")]);
    std::fs::write(
        &fx.log_path,
        serde_json::to_string_pretty(&json!({
            "name": "demo",
            "published_project": {
                "demo": [{ "id": "v1", "url": "https://example.com/graphics/demo/v1" }],
                "other": [{ "id": "x", "url": "https://example.com/graphics/other/x" }]
            },
            "zeta": true
        }))
        .unwrap(),
    )
    .unwrap();

    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store, options(&fx.log_path));
    deployer
        .deploy(&request(&fx.source, "v2", None))
        .await
        .unwrap();

    let log = read_log(&fx.log_path);
    let ids: Vec<&str> = log["published_project"]["demo"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["v1", "v2"]);
    assert_eq!(log["published_project"]["other"][0]["id"], "x");
    assert_eq!(log["name"], "demo");
    assert_eq!(log["zeta"], true);

    let keys: Vec<&String> = log.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "published_project", "zeta"]);
}

#[tokio::test]
async fn test_append_without_prior_artifact_uploads_nothing() {
    let fx = fixture(&[("12/0/0.png", "tile")]);
    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let result = deployer
        .deploy(&request(&fx.source, "build-2", Some("12")))
        .await;

    assert!(matches!(
        result,
        Err(DeployError::AppendTargetNotFound { .. })
    ));
    assert_eq!(store.attempts(), 0);
    assert!(!fx.log_path.exists());
}

#[tokio::test]
async fn test_append_nests_under_latest_artifact() {
    let fx = fixture(&[("12/0/0.png", "tile-a"), ("12/0/1.png", "tile-b"), ("11/0/0.png", "skip")]);
    let log = serde_json::to_string_pretty(&json!({
        "published_project": {
            "demo": [
                { "id": "v1", "url": "https://example.com/graphics/demo/v1" },
                { "id": "v2", "url": "https://example.com/graphics/demo/v2" }
            ]
        }
    }))
    .unwrap();
    std::fs::write(&fx.log_path, &log).unwrap();

    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));
    let report = deployer
        .deploy(&request(&fx.source, "build-3", Some("12")))
        .await
        .unwrap();

    assert!(report.success);
    assert!(!report.log_updated);
    assert_eq!(report.artifact_id, "v2/12");
    assert_eq!(report.appended_to.as_deref(), Some("v2"));
    assert_eq!(
        store.keys(),
        vec!["graphics/demo/v2/12/0/0.png", "graphics/demo/v2/12/0/1.png"]
    );
    assert_eq!(std::fs::read_to_string(&fx.log_path).unwrap(), log);
}

#[tokio::test]
async fn test_missing_source_is_rejected() {
    let fx = fixture(&[]);
    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let missing = fx.source.join("nope");
    let result = deployer.deploy(&request(&missing, "v1", None)).await;

    match result {
        Err(DeployError::PathNotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected PathNotFound, got {other:?}"),
    }
    assert_eq!(store.attempts(), 0);
}

#[tokio::test]
async fn test_malformed_log_fails_before_upload() {
    let fx = fixture(&[("a.png", "aaa")]);
    std::fs::write(&fx.log_path, "[1, 2, 3]").unwrap();
    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let result = deployer.deploy(&request(&fx.source, "v1", None)).await;

    assert!(matches!(result, Err(DeployError::LogFormat(_))));
    assert_eq!(store.attempts(), 0);
}

#[tokio::test]
async fn test_ignored_files_are_not_uploaded() {
    let fx = fixture(&[
        ("a.png", "aaa"),
        (".DS_Store", "junk"),
        ("img/.DS_Store", "junk"),
        ("img/c.png", "c"),
    ]);
    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let report = deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(
        store.keys(),
        vec!["graphics/demo/v1/a.png", "graphics/demo/v1/img/c.png"]
    );
}

#[tokio::test]
async fn test_empty_source_is_recorded() {
    let fx = fixture(&[]);
    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let deployer = Deployer::new(store.clone(), options(&fx.log_path));

    let report = deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.total(), 0);
    assert!(report.log_updated);
    assert_eq!(store.attempts(), 0);
    assert_eq!(read_log(&fx.log_path)["published_project"]["demo"][0]["id"], "v1");
}

#[tokio::test]
async fn test_events_bracket_the_deployment() {
    let fx = fixture(&[("a.png", "aaa"), ("b.png", "bb"), ("c.png", "c")]);
    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let (observer, mut events) = ChannelObserver::channel();
    let deployer = Deployer::new(store, options(&fx.log_path)).with_observer(Arc::new(observer));

    deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(received.first(), Some(DeployEvent::Started { .. })));
    assert!(matches!(received.get(1), Some(DeployEvent::Discovered { total: 3 })));
    match received.last() {
        Some(DeployEvent::Finished(report)) => assert!(report.success),
        other => panic!("expected Finished, got {other:?}"),
    }
    let uploaded = received
        .iter()
        .filter(|e| matches!(e, DeployEvent::FileUploaded { .. }))
        .count();
    assert_eq!(uploaded, 3);
}

#[tokio::test]
async fn test_dry_run_mirrors_tree_locally() {
    let fx = fixture(&[("a.png", "aaa"), ("img/b.png", "bb")]);
    let mirror = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalObjectStore::new(mirror.path()));
    let deployer = Deployer::new(store, options(&fx.log_path));

    let report = deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    assert!(report.success);
    let b = mirror.path().join("graphics/demo/v1/img/b.png");
    assert_eq!(std::fs::read_to_string(b).unwrap(), "bb");
    assert!(report.origin_url.starts_with("file://"));
}

#[tokio::test]
async fn test_log_write_failure_still_reports_published_files() {
    let fx = fixture(&[("a.png", "aaa"), ("b.png", "bb")]);
    let blocker = fx.source.parent().unwrap().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let log_path = blocker.join("config.json");

    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let (observer, mut events) = ChannelObserver::channel();
    let deployer = Deployer::new(store.clone(), options(&log_path)).with_observer(Arc::new(observer));

    let report = deployer
        .deploy(&request(&fx.source, "v1", None))
        .await
        .unwrap();

    assert!(report.success);
    assert!(!report.log_updated);
    assert!(report.log_error.is_some());
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.public_url, "https://example.com/graphics/demo/v1");
    assert_eq!(
        store.keys(),
        vec!["graphics/demo/v1/a.png", "graphics/demo/v1/b.png"]
    );

    let mut finished = None;
    while let Ok(event) = events.try_recv() {
        if let DeployEvent::Finished(report) = event {
            finished = Some(report);
        }
    }
    let finished = finished.expect("Finished event");
    assert!(finished.log_error.is_some());
}

#[tokio::test]
async fn test_missing_append_subdir_aborts_before_start() {
    let fx = fixture(&[("11/0/0.png", "tile")]);
    std::fs::write(
        &fx.log_path,
        serde_json::to_string_pretty(&json!({
            "published_project": {
                "demo": [{ "id": "v1", "url": "https://example.com/graphics/demo/v1" }]
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let store = Arc::new(InstrumentedStore::new(Duration::ZERO));
    let (observer, mut events) = ChannelObserver::channel();
    let deployer = Deployer::new(store.clone(), options(&fx.log_path)).with_observer(Arc::new(observer));

    let result = deployer
        .deploy(&request(&fx.source, "build-2", Some("12")))
        .await;

    assert!(matches!(result, Err(DeployError::PathNotFound(_))));
    assert!(events.try_recv().is_err(), "no event may precede discovery");
    assert_eq!(store.attempts(), 0);
}
