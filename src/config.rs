//! Workflow configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tuning knobs for [`IngestWorkflow`](crate::ingest::IngestWorkflow) plus
/// environment-resolved backend locations.
///
/// `Default` reads `SUMVAULT_DB` and `SUMVAULT_BLOB_ROOT` from the
/// environment (a `.env` file is honored via `dotenvy`).
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Retries for the blob metadata read-modify-write after a
    /// precondition conflict. Past the limit the update is dropped.
    pub metadata_retry_limit: u32,
    /// Re-reads of an in-flight entry before giving up and returning it
    /// as observed.
    pub pending_poll_limit: u32,
    /// Delay between those re-reads.
    pub pending_poll_delay: Duration,
    /// SQLite database name for the document index backend.
    pub sqlite_db_name: String,
    /// Root directory for the filesystem blob store backend.
    pub blob_root: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        dotenvy::dotenv().ok();
        Self {
            metadata_retry_limit: 1,
            pending_poll_limit: 40,
            pending_poll_delay: Duration::from_millis(50),
            sqlite_db_name: std::env::var("SUMVAULT_DB")
                .unwrap_or_else(|_| "sumvault.db".to_string()),
            blob_root: std::env::var("SUMVAULT_BLOB_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("blobs")),
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn with_metadata_retry_limit(mut self, limit: u32) -> Self {
        self.metadata_retry_limit = limit;
        self
    }

    #[must_use]
    pub fn with_pending_poll(mut self, limit: u32, delay: Duration) -> Self {
        self.pending_poll_limit = limit;
        self.pending_poll_delay = delay;
        self
    }

    #[must_use]
    pub fn with_sqlite_db_name(mut self, name: impl Into<String>) -> Self {
        self.sqlite_db_name = name.into();
        self
    }

    #[must_use]
    pub fn with_blob_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.blob_root = root.into();
        self
    }
}
