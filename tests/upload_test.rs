mod helpers;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::head;
use axum::Router;
use helpers::{spawn_mock, MemoryBlobStore, TEST_ACCOUNT_KEY};
use lookbook::config::BlobConfig;
use lookbook::pipeline::upload_directory;
use lookbook::storage::azure::AzureBlobStore;
use lookbook::storage::BlobStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn catalog_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("boot.jpg"), b"boot").unwrap();
    std::fs::write(tmp.path().join("hat.png"), b"hat").unwrap();
    std::fs::create_dir(tmp.path().join("summer")).unwrap();
    std::fs::write(tmp.path().join("summer").join("sandal.jpg"), b"sandal").unwrap();
    tmp
}

#[tokio::test]
async fn second_run_uploads_nothing() {
    let dir = catalog_dir();
    let store = MemoryBlobStore::default();

    let first = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(first.uploaded, 3);
    assert_eq!(first.skipped, 0);
    assert_eq!(store.names(), vec!["boot.jpg", "hat.png", "sandal.jpg"]);

    let second = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(second.uploaded, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(store.upload_count(), 3);
}

#[tokio::test]
async fn lookup_failure_does_not_stop_the_batch() {
    let dir = catalog_dir();
    let store = MemoryBlobStore::default();
    store.fail_lookup("hat.png");

    let report = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.uploaded, 2);
    assert_eq!(store.names(), vec!["boot.jpg", "sandal.jpg"]);
}

#[tokio::test]
async fn same_name_in_two_folders_shares_one_blob() {
    let dir = catalog_dir();
    std::fs::create_dir(dir.path().join("winter")).unwrap();
    std::fs::write(dir.path().join("winter").join("sandal.jpg"), b"winter sandal").unwrap();
    let store = MemoryBlobStore::default();

    let report = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(report.uploaded, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.duplicates, 1);
    assert_eq!(store.names().len(), 3);
    // The first file in walk order keeps the name.
    assert_eq!(
        store.blobs.lock().unwrap().get("sandal.jpg").map(Vec::as_slice),
        Some(&b"sandal"[..])
    );
}

#[tokio::test]
async fn duplicate_name_is_not_uploaded_when_the_first_upload_fails() {
    let dir = catalog_dir();
    std::fs::create_dir(dir.path().join("winter")).unwrap();
    std::fs::write(dir.path().join("winter").join("sandal.jpg"), b"winter sandal").unwrap();
    let store = MemoryBlobStore::default();
    store.fail_lookup("sandal.jpg");

    let report = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.duplicates, 1);
    assert!(!store.names().contains(&"sandal.jpg".to_string()));
}

// ── Azure REST client against a local mock ───────────────────────────────────

#[derive(Clone, Default)]
struct BlobState {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    puts: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
}

async fn head_blob(
    State(state): State<BlobState>,
    Path((_container, blob)): Path<(String, String)>,
    uri: Uri,
) -> StatusCode {
    state
        .queries
        .lock()
        .unwrap()
        .push(uri.query().unwrap_or_default().to_string());
    if state.blobs.lock().unwrap().contains_key(&blob) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn put_blob(
    State(state): State<BlobState>,
    Path((_container, blob)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> StatusCode {
    if headers.get("x-ms-blob-type").and_then(|v| v.to_str().ok()) != Some("BlockBlob") {
        return StatusCode::BAD_REQUEST;
    }
    state
        .queries
        .lock()
        .unwrap()
        .push(uri.query().unwrap_or_default().to_string());
    state.puts.fetch_add(1, Ordering::SeqCst);
    state.blobs.lock().unwrap().insert(blob, body.to_vec());
    StatusCode::CREATED
}

async fn azure_store(state: BlobState) -> AzureBlobStore {
    let router = Router::new()
        .route(
            "/devstoreaccount1/{container}/{blob}",
            head(head_blob).put(put_blob),
        )
        .with_state(state);
    let base = spawn_mock(router).await;
    let config = BlobConfig {
        connection_string: format!(
            "AccountName=devstoreaccount1;AccountKey={TEST_ACCOUNT_KEY};BlobEndpoint={base}/devstoreaccount1"
        ),
        container_name: "products".into(),
        ..Default::default()
    };
    AzureBlobStore::new(&config).unwrap()
}

#[tokio::test]
async fn azure_store_uploads_once_and_then_skips() {
    let dir = catalog_dir();
    let state = BlobState::default();
    let store = azure_store(state.clone()).await;

    let first = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(first.uploaded, 3);
    assert_eq!(first.failed, 0);

    let second = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(second.uploaded, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(state.puts.load(Ordering::SeqCst), 3);
    assert_eq!(
        state.blobs.lock().unwrap().get("boot.jpg").map(Vec::as_slice),
        Some(&b"boot"[..])
    );

    // Every request is authorized by a SAS token.
    for query in state.queries.lock().unwrap().iter() {
        assert!(query.contains("sig="), "unsigned request: {query}");
        assert!(query.contains("sr=b"));
    }
}

#[tokio::test]
async fn azure_store_reports_properties() {
    let state = BlobState::default();
    state
        .blobs
        .lock()
        .unwrap()
        .insert("boot.jpg".into(), b"boot".to_vec());
    let store = azure_store(state).await;

    assert!(store.properties("boot.jpg").await.unwrap().is_some());
    assert!(store.properties("missing.jpg").await.unwrap().is_none());
}

#[tokio::test]
async fn unreachable_store_counts_failures() {
    let dir = catalog_dir();
    let config = BlobConfig {
        connection_string: format!(
            "AccountName=devstoreaccount1;AccountKey={TEST_ACCOUNT_KEY};BlobEndpoint=http://127.0.0.1:1/devstoreaccount1"
        ),
        container_name: "products".into(),
        ..Default::default()
    };
    let store = AzureBlobStore::new(&config).unwrap();

    let report = upload_directory(&store, dir.path()).await.unwrap();
    assert_eq!(report.failed, 3);
    assert_eq!(report.uploaded, 0);
}
