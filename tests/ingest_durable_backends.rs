#![cfg(feature = "sqlite")]

//! End-to-end ingest against the durable backends: filesystem blobs plus
//! the SQLite document index.

use std::sync::Arc;

use sumvault::content::ContentHash;
use sumvault::ingest::{IngestScope, IngestWorkflow};
use sumvault::stores::{BlobStore, FsBlobStore, SqliteDocumentIndex};
use tempfile::tempdir;

mod common;
use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dedup_and_cache_survive_across_workflow_instances() {
    let dir = tempdir().expect("tempdir");
    let db_url = format!("sqlite://{}/index.db?mode=rwc", dir.path().display());
    let blob_root = dir.path().join("blobs");

    let summarizer = CountingSummarizer::new();
    let scope = IngestScope::for_assistant("X", "gpt-4o");

    let first = {
        let workflow = IngestWorkflow::new(
            Arc::new(FsBlobStore::new(&blob_root)),
            Arc::new(SqliteDocumentIndex::connect(&db_url).await.expect("connect")),
            summarizer.clone(),
        );
        workflow
            .ingest(&upload(b"hello", "a.txt"), &scope)
            .await
            .expect("first ingest")
    };

    // A fresh workflow over the same storage reuses blob and summary.
    let workflow = IngestWorkflow::new(
        Arc::new(FsBlobStore::new(&blob_root)),
        Arc::new(SqliteDocumentIndex::connect(&db_url).await.expect("connect")),
        summarizer.clone(),
    );
    let second = workflow
        .ingest(&upload(b"hello", "b.txt"), &scope)
        .await
        .expect("second ingest");

    assert_eq!(summarizer.calls(), 1);
    assert_eq!(first.summary, second.summary);

    let blobs = FsBlobStore::new(&blob_root);
    let key = ContentHash::address_of(b"hello").storage_key();
    let meta = blobs.get_metadata(&key).await.expect("metadata");
    assert!(meta.file_names.contains("a.txt"));
    assert!(meta.file_names.contains("b.txt"));
    assert_eq!(meta.size, 5);
}
