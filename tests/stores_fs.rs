use std::collections::BTreeSet;

use sumvault::stores::{BlobStore, BlobStoreError, FsBlobStore};
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn put_then_exists_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let store = FsBlobStore::new(dir.path());

    assert!(!store.exists("deadbeef").await.unwrap());
    store.put("deadbeef", b"raw bytes").await.unwrap();
    assert!(store.exists("deadbeef").await.unwrap());

    let meta = store.get_metadata("deadbeef").await.unwrap();
    assert_eq!(meta.size, 9);
    assert_eq!(meta.generation, 0);
    assert!(meta.file_names.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metadata_merge_bumps_generation() {
    let dir = tempdir().expect("tempdir");
    let store = FsBlobStore::new(dir.path());
    store.put("k", b"x").await.unwrap();

    let meta = store.get_metadata("k").await.unwrap();
    store
        .set_metadata("k", BTreeSet::from(["a.txt".into()]), meta.generation)
        .await
        .unwrap();

    let meta = store.get_metadata("k").await.unwrap();
    assert_eq!(meta.generation, 1);
    assert!(meta.file_names.contains("a.txt"));

    store
        .set_metadata(
            "k",
            BTreeSet::from(["a.txt".into(), "b.txt".into()]),
            meta.generation,
        )
        .await
        .unwrap();
    let meta = store.get_metadata("k").await.unwrap();
    assert_eq!(meta.generation, 2);
    assert_eq!(meta.file_names.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_generation_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let store = FsBlobStore::new(dir.path());
    store.put("k", b"x").await.unwrap();

    store
        .set_metadata("k", BTreeSet::from(["a.txt".into()]), 0)
        .await
        .unwrap();

    let err = store
        .set_metadata("k", BTreeSet::from(["b.txt".into()]), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, BlobStoreError::PreconditionFailed { .. }));

    // The stored names are untouched by the rejected write.
    let meta = store.get_metadata("k").await.unwrap();
    assert_eq!(meta.file_names, BTreeSet::from(["a.txt".into()]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_blob_metadata_is_not_found() {
    let dir = tempdir().expect("tempdir");
    let store = FsBlobStore::new(dir.path());

    let err = store.get_metadata("absent").await.unwrap_err();
    assert!(matches!(err, BlobStoreError::NotFound { .. }));
}
