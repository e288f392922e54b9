use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use sumvault::content::UploadedContent;
use sumvault::ingest::IngestWorkflow;
use sumvault::stores::{
    BlobMetadata, BlobStore, BlobStoreError, InMemoryBlobStore, InMemoryDocumentIndex, Summarizer,
};

pub fn upload(bytes: &[u8], file_name: &str) -> UploadedContent {
    UploadedContent::new(bytes.to_vec(), file_name)
}

/// Workflow wired to fresh in-memory stores, returning handles to both so
/// tests can assert on stored state.
pub fn memory_workflow(
    summarizer: Arc<dyn Summarizer>,
) -> (
    IngestWorkflow,
    Arc<InMemoryBlobStore>,
    Arc<InMemoryDocumentIndex>,
) {
    let blobs = Arc::new(InMemoryBlobStore::new());
    let index = Arc::new(InMemoryDocumentIndex::new());
    let workflow = IngestWorkflow::new(blobs.clone(), index.clone(), summarizer);
    (workflow, blobs, index)
}

/// Blob store whose metadata writes always hit a precondition conflict,
/// simulating a concurrent writer that keeps winning.
#[derive(Debug, Default)]
pub struct ContendedBlobStore {
    inner: InMemoryBlobStore,
}

impl ContendedBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl BlobStore for ContendedBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        self.inner.exists(key).await
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        self.inner.put(key, bytes).await
    }

    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata, BlobStoreError> {
        self.inner.get_metadata(key).await
    }

    async fn set_metadata(
        &self,
        key: &str,
        _file_names: BTreeSet<String>,
        _if_generation: u64,
    ) -> Result<(), BlobStoreError> {
        Err(BlobStoreError::PreconditionFailed {
            key: key.to_string(),
        })
    }
}
