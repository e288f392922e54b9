//! # Sumvault: content-addressed ingestion with cached summarization
//!
//! Sumvault ingests uploaded documents, deduplicates them by content hash
//! in a blob store, and caches AI summarization results in a document
//! index keyed by `(content hash, assistant, model)`. Identical content is
//! stored once and summarized once per scope, no matter how many times or
//! under how many filenames it is uploaded.
//!
//! ## Core Concepts
//!
//! - **Content addressing**: a 256-bit digest of the exact bytes is the
//!   sole identity across both stores.
//! - **Conditional create**: the document index's `get_or_create` admits
//!   exactly one creator per key, so concurrent identical uploads never
//!   trigger duplicate summarization calls.
//! - **Explicit summary lifecycle**: `Pending`, `Ready`, and `Failed` are
//!   distinct persisted states; a failed run is retried on the next
//!   identical upload instead of being served from cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sumvault::{
//!     content::UploadedContent,
//!     ingest::{IngestScope, IngestWorkflow},
//!     stores::{FsBlobStore, HttpSummarizer, InMemoryDocumentIndex},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = IngestWorkflow::new(
//!     Arc::new(FsBlobStore::new("blobs")),
//!     Arc::new(InMemoryDocumentIndex::new()),
//!     Arc::new(HttpSummarizer::new("https://summarizer.internal/v1/summarize".parse()?)),
//! );
//!
//! let upload = UploadedContent::new(b"quarterly report...".to_vec(), "report.pdf");
//! let entry = workflow
//!     .ingest(&upload, &IngestScope::for_model("gpt-4o"))
//!     .await?;
//! println!("summary: {:?}", entry.summary.text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`content`] - Content hashing and the upload type
//! - [`document`] - Document entries, composite keys, summary lifecycle
//! - [`ingest`] - The ingest workflow and its error surface
//! - [`stores`] - Adapter traits and the bundled backends
//! - [`config`] - Workflow tuning and environment resolution
//! - [`telemetry`] - Tracing subscriber setup

pub mod config;
pub mod content;
pub mod document;
pub mod ingest;
pub mod stores;
pub mod telemetry;

pub use config::IngestConfig;
pub use content::{ContentHash, UploadedContent};
pub use document::{DocumentEntry, DocumentKey, SummaryState};
pub use ingest::{IngestError, IngestScope, IngestWorkflow};
