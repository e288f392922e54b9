//! Volatile in-memory backends for tests and development.
//!
//! Both stores honor the full adapter contracts: the blob store tracks a
//! metadata generation counter so precondition conflicts are observable,
//! and the document index performs its conditional create atomically under
//! the map lock, so exactly one concurrent caller per key wins.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::document::{DocumentEntry, DocumentKey};
use crate::stores::{BlobMetadata, BlobStore, BlobStoreError, DocumentIndex, IndexError};

#[derive(Clone, Debug, Default)]
struct StoredBlob {
    bytes: Vec<u8>,
    meta: BlobMetadata,
}

/// In-memory [`BlobStore`].
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes for `key`, for assertions in tests.
    pub fn bytes_of(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(key).map(|b| b.bytes.clone())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        Ok(self.blobs.lock().contains_key(key))
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let mut blobs = self.blobs.lock();
        let blob = blobs.entry(key.to_string()).or_default();
        blob.bytes = bytes.to_vec();
        blob.meta.size = bytes.len() as u64;
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata, BlobStoreError> {
        self.blobs
            .lock()
            .get(key)
            .map(|b| b.meta.clone())
            .ok_or_else(|| BlobStoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn set_metadata(
        &self,
        key: &str,
        file_names: BTreeSet<String>,
        if_generation: u64,
    ) -> Result<(), BlobStoreError> {
        let mut blobs = self.blobs.lock();
        let blob = blobs.get_mut(key).ok_or_else(|| BlobStoreError::NotFound {
            key: key.to_string(),
        })?;
        if blob.meta.generation != if_generation {
            return Err(BlobStoreError::PreconditionFailed {
                key: key.to_string(),
            });
        }
        blob.meta.file_names = file_names;
        blob.meta.generation += 1;
        Ok(())
    }
}

/// In-memory [`DocumentIndex`].
#[derive(Debug, Default)]
pub struct InMemoryDocumentIndex {
    entries: Mutex<HashMap<String, DocumentEntry>>,
}

impl InMemoryDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl DocumentIndex for InMemoryDocumentIndex {
    async fn get_or_create(
        &self,
        initial: DocumentEntry,
    ) -> Result<(DocumentEntry, bool), IndexError> {
        let mut entries = self.entries.lock();
        let encoded = initial.key.encode();
        if let Some(existing) = entries.get(&encoded) {
            return Ok((existing.clone(), false));
        }
        entries.insert(encoded, initial.clone());
        Ok((initial, true))
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<DocumentEntry>, IndexError> {
        Ok(self.entries.lock().get(&key.encode()).cloned())
    }

    async fn update(&self, entry: &DocumentEntry) -> Result<(), IndexError> {
        self.entries
            .lock()
            .insert(entry.key.encode(), entry.clone());
        Ok(())
    }
}
