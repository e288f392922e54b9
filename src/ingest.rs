//! The ingest workflow: content-addressed deduplication with an
//! idempotent-create summarization cache.
//!
//! [`IngestWorkflow::ingest`] is the one operation with real control flow:
//!
//! 1. Hash the bytes; the hash is the blob key and the root of the
//!    document-index key.
//! 2. Upload the blob if absent, then merge the incoming filename into the
//!    blob metadata (best-effort, bounded retry on a concurrent writer).
//! 3. Conditionally create the document entry. The creator calls the
//!    summarizer; everyone else reuses the cached result, retries a
//!    previously failed run, or waits out an in-flight one.
//!
//! The conditional create is what guarantees that at most one summarization
//! call is issued per `(hash, assistant, model)` on the success path, even
//! when identical uploads arrive concurrently.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::IngestConfig;
use crate::content::{ContentHash, UploadedContent};
use crate::document::{DocumentEntry, DocumentKey, SummaryState};
use crate::stores::{BlobStore, BlobStoreError, DocumentIndex, IndexError, Summarizer};

/// Optional scoping dimensions for a summarization run.
///
/// One deployment scopes entries by nothing, another by model only, another
/// by assistant and model; absent fields are simply omitted from the
/// composite key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestScope {
    pub assistant_id: Option<String>,
    pub model: Option<String>,
}

impl IngestScope {
    /// No scoping: one summary per distinct content.
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Scope by model only.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            assistant_id: None,
            model: Some(model.into()),
        }
    }

    /// Scope by assistant and model.
    pub fn for_assistant(assistant_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            assistant_id: Some(assistant_id.into()),
            model: Some(model.into()),
        }
    }
}

/// Errors surfaced to the ingest caller.
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    /// Blob store or document index unreachable; no partial state was
    /// committed on this code path.
    #[error("storage unavailable: {message}")]
    #[diagnostic(
        code(sumvault::ingest::storage),
        help("Check connectivity to the blob store and document index backends.")
    )]
    StorageUnavailable { message: String },

    /// The upstream summarizer failed. The entry has been persisted with
    /// an explicit failed status, so the next identical upload retries.
    #[error("summarization failed: {message}")]
    #[diagnostic(code(sumvault::ingest::summarization))]
    Summarization { message: String },
}

impl From<BlobStoreError> for IngestError {
    fn from(e: BlobStoreError) -> Self {
        IngestError::StorageUnavailable {
            message: e.to_string(),
        }
    }
}

impl From<IndexError> for IngestError {
    fn from(e: IndexError) -> Self {
        IngestError::StorageUnavailable {
            message: e.to_string(),
        }
    }
}

/// Orchestrates blob deduplication and the summarization cache across the
/// three adapter seams.
pub struct IngestWorkflow {
    blobs: Arc<dyn BlobStore>,
    index: Arc<dyn DocumentIndex>,
    summarizer: Arc<dyn Summarizer>,
    config: IngestConfig,
}

impl IngestWorkflow {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        index: Arc<dyn DocumentIndex>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            blobs,
            index,
            summarizer,
            config: IngestConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Ingest one upload: deduplicate the bytes, then return the cached or
    /// freshly produced document entry for the given scope.
    #[instrument(skip(self, content), fields(file_name = %content.file_name), err)]
    pub async fn ingest(
        &self,
        content: &UploadedContent,
        scope: &IngestScope,
    ) -> Result<DocumentEntry, IngestError> {
        let hash = ContentHash::address_of(&content.bytes);
        let blob_key = hash.storage_key();

        self.dedup_blob(&blob_key, content).await?;

        let key = DocumentKey::new(&hash, scope);
        let initial = DocumentEntry::pending(key.clone(), content.byte_size(), &content.file_name);
        let (mut entry, created) = self.index.get_or_create(initial).await?;

        if created {
            debug!(key = %key, "created document entry, running summarization");
            return self.run_summarization(entry, content, scope).await;
        }

        // Repeat upload of known content. The filename merge is persisted
        // only against a non-pending observation: writing a stale Pending
        // entry back could clobber the winner's Ready update.
        match entry.summary.clone() {
            SummaryState::Ready { .. } => {
                debug!(key = %key, "summary served from cache");
                if entry.merge_file_name(&content.file_name) {
                    self.index.update(&entry).await?;
                }
                Ok(entry)
            }
            SummaryState::Failed { message } => {
                debug!(key = %key, previous_failure = %message, "retrying failed summarization");
                entry.merge_file_name(&content.file_name);
                entry.summary = SummaryState::Pending;
                self.index.update(&entry).await?;
                self.run_summarization(entry, content, scope).await
            }
            SummaryState::Pending => {
                let mut latest = self.await_in_flight(entry).await?;
                if latest.merge_file_name(&content.file_name) && !latest.summary.is_pending() {
                    self.index.update(&latest).await?;
                }
                Ok(latest)
            }
        }
    }

    /// Upload the blob if absent and merge the filename into its metadata.
    ///
    /// The metadata merge is read-modify-write guarded by the generation
    /// precondition. A concurrent writer costs one bounded retry; after
    /// that the update is dropped. Filenames are informational bookkeeping,
    /// so a lost update here must never fail the ingest.
    async fn dedup_blob(&self, key: &str, content: &UploadedContent) -> Result<(), IngestError> {
        if !self.blobs.exists(key).await? {
            self.blobs.put(key, &content.bytes).await?;
        }

        let mut attempt = 0;
        loop {
            let meta = self.blobs.get_metadata(key).await?;
            let mut file_names = meta.file_names;
            if !file_names.insert(content.file_name.clone()) {
                return Ok(());
            }
            match self
                .blobs
                .set_metadata(key, file_names, meta.generation)
                .await
            {
                Ok(()) => return Ok(()),
                Err(BlobStoreError::PreconditionFailed { .. })
                    if attempt < self.config.metadata_retry_limit =>
                {
                    attempt += 1;
                    debug!(key, attempt, "blob metadata conflict, retrying merge");
                }
                Err(BlobStoreError::PreconditionFailed { .. }) => {
                    warn!(key, "blob metadata conflict persisted, dropping filename update");
                    return Ok(());
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Winner path: call the summarizer and persist the outcome. A failure
    /// is recorded as an explicit `Failed` state before being surfaced, so
    /// it can never be confused with a summary that is still in flight.
    async fn run_summarization(
        &self,
        mut entry: DocumentEntry,
        content: &UploadedContent,
        scope: &IngestScope,
    ) -> Result<DocumentEntry, IngestError> {
        match self
            .summarizer
            .summarize(&content.bytes, &content.file_name, scope.model.as_deref())
            .await
        {
            Ok(text) => {
                entry.summary = SummaryState::Ready { text };
                self.index.update(&entry).await?;
                Ok(entry)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(key = %entry.key, error = %message, "summarization failed");
                entry.summary = SummaryState::Failed {
                    message: message.clone(),
                };
                self.index.update(&entry).await?;
                Err(IngestError::Summarization { message })
            }
        }
    }

    /// Loser path for an in-flight summarization: re-read the entry a
    /// bounded number of times instead of issuing a duplicate expensive
    /// call, then return whatever state was last observed.
    async fn await_in_flight(&self, entry: DocumentEntry) -> Result<DocumentEntry, IngestError> {
        let key = entry.key.clone();
        let mut latest = entry;
        for _ in 0..self.config.pending_poll_limit {
            if !latest.summary.is_pending() {
                return Ok(latest);
            }
            tokio::time::sleep(self.config.pending_poll_delay).await;
            if let Some(fresh) = self.index.get(&key).await? {
                latest = fresh;
            }
        }
        debug!(key = %key, "summarization still in flight after poll budget");
        Ok(latest)
    }
}
