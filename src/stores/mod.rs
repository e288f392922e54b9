//! Storage and summarizer adapters consumed by the ingest workflow.
//!
//! The workflow only sees three seams:
//!
//! - [`BlobStore`] — content-addressed raw byte storage with
//!   optimistic-concurrency metadata updates.
//! - [`DocumentIndex`] — key-value store for [`DocumentEntry`] records with
//!   a conditional create (`get_or_create`), the primitive that prevents
//!   duplicate summarization under concurrency.
//! - [`Summarizer`] — the expensive upstream call.
//!
//! Backends are swappable: in-memory implementations for tests and
//! development, a filesystem blob store, a SQLite document index, and an
//! HTTP summarizer ship in the submodules.

use std::collections::BTreeSet;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{DocumentEntry, DocumentKey};

pub mod fs;
pub mod http;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use fs::FsBlobStore;
pub use http::HttpSummarizer;
pub use memory::{InMemoryBlobStore, InMemoryDocumentIndex};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentIndex;

/// Metadata attached to a stored blob.
///
/// `generation` is an opaque counter bumped on every metadata write; it is
/// the precondition token for [`BlobStore::set_metadata`], mirroring object
/// stores that reject a patch when the metadata changed since it was read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub file_names: BTreeSet<String>,
    pub size: u64,
    pub generation: u64,
}

/// Content-addressed storage for raw document bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object is already stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError>;

    /// Store `bytes` under `key`. Overwriting an existing object with
    /// identical content is harmless (the key is its hash).
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError>;

    /// Current metadata for the object at `key`.
    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata, BlobStoreError>;

    /// Replace the filename set, provided the metadata generation still
    /// matches `if_generation`. Returns
    /// [`BlobStoreError::PreconditionFailed`] when a concurrent writer got
    /// there first; callers decide whether to retry or drop the update.
    async fn set_metadata(
        &self,
        key: &str,
        file_names: BTreeSet<String>,
        if_generation: u64,
    ) -> Result<(), BlobStoreError>;
}

/// Key-value store for cached summarization results.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Conditional create: persist `initial` if no entry exists for its
    /// key, otherwise leave the stored entry untouched. Returns the entry
    /// now in the store and whether this call created it. Exactly one of
    /// any set of concurrent callers for the same key observes `true`.
    async fn get_or_create(&self, initial: DocumentEntry) -> Result<(DocumentEntry, bool), IndexError>;

    /// Fetch the entry for `key`, if any.
    async fn get(&self, key: &DocumentKey) -> Result<Option<DocumentEntry>, IndexError>;

    /// Whole-entity overwrite of an existing entry.
    async fn update(&self, entry: &DocumentEntry) -> Result<(), IndexError>;
}

/// Upstream service that turns raw document bytes into a natural-language
/// summary. May take arbitrary latency; callers must not block unrelated
/// requests on it.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        bytes: &[u8],
        file_name: &str,
        model_hint: Option<&str>,
    ) -> Result<String, SummarizerError>;
}

#[derive(Debug, Error, Diagnostic)]
pub enum BlobStoreError {
    #[error("no blob stored under key {key}")]
    #[diagnostic(
        code(sumvault::blob::not_found),
        help("Upload the content before reading its metadata.")
    )]
    NotFound { key: String },

    #[error("metadata precondition failed for key {key}")]
    #[diagnostic(
        code(sumvault::blob::precondition),
        help("A concurrent writer updated the metadata; re-read and retry or drop the update.")
    )]
    PreconditionFailed { key: String },

    #[error("blob store backend error: {message}")]
    #[diagnostic(code(sumvault::blob::backend))]
    Backend { message: String },
}

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("document index backend error: {message}")]
    #[diagnostic(code(sumvault::index::backend))]
    Backend { message: String },

    #[error("stored entry could not be decoded: {0}")]
    #[diagnostic(
        code(sumvault::index::serde),
        help("Check that the persisted row matches the DocumentEntry shape.")
    )]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error, Diagnostic)]
pub enum SummarizerError {
    #[error("summarizer upstream failure: {message}")]
    #[diagnostic(
        code(sumvault::summarizer::upstream),
        help("The summarization backend rejected the request; the entry is recorded as failed and will be retried on the next identical upload.")
    )]
    Upstream { message: String },

    #[error("summarizer transport error: {message}")]
    #[diagnostic(code(sumvault::summarizer::transport))]
    Transport { message: String },
}
