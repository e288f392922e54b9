//! Document-index data model.
//!
//! A [`DocumentEntry`] caches the result of one summarization run, keyed by
//! the content hash plus the optional assistant/model scope under which the
//! summary was produced. Entries are created once per distinct key; the
//! summary transitions `Pending -> Ready` exactly once on the success path,
//! or `Pending -> Failed` when the upstream summarizer errors, in which case
//! the next identical request retries.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::ContentHash;
use crate::ingest::IngestScope;

/// Separator for the encoded composite key. Not expected in hex digests,
/// assistant identifiers, or model names (which may contain `-`).
pub const KEY_SEPARATOR: &str = "::";

/// Composite identity of a cached summary: content hash plus the optional
/// scoping dimensions, in that fixed order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// Hex-encoded content hash.
    pub hash: String,
    pub assistant_id: Option<String>,
    pub model: Option<String>,
}

impl DocumentKey {
    pub fn new(hash: &ContentHash, scope: &IngestScope) -> Self {
        Self {
            hash: hash.to_hex(),
            assistant_id: scope.assistant_id.clone(),
            model: scope.model.clone(),
        }
    }

    /// Encode as a single string: hash, then assistant id, then model,
    /// joined by [`KEY_SEPARATOR`]. Absent scope fields are omitted.
    pub fn encode(&self) -> String {
        let mut parts = vec![self.hash.as_str()];
        if let Some(assistant_id) = &self.assistant_id {
            parts.push(assistant_id.as_str());
        }
        if let Some(model) = &self.model {
            parts.push(model.as_str());
        }
        parts.join(KEY_SEPARATOR)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Lifecycle of a cached summary.
///
/// `Pending` and `Failed` are deliberately distinct states: a missing
/// summary must never be mistaken for a failed one, otherwise a failed run
/// would be served from cache forever.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryState {
    /// Entry created, summarization in flight.
    Pending,
    /// Summarization succeeded; the text is immutable from here on.
    Ready { text: String },
    /// Upstream summarizer failed; eligible for retry on the next
    /// identical request.
    Failed { message: String },
}

impl SummaryState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SummaryState::Ready { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SummaryState::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SummaryState::Failed { .. })
    }

    /// Summary text, if one has been produced.
    pub fn text(&self) -> Option<&str> {
        match self {
            SummaryState::Ready { text } => Some(text),
            _ => None,
        }
    }
}

/// One cached summarization result plus provenance metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub key: DocumentKey,
    pub file_size: u64,
    /// Every original filename this content has been uploaded under.
    /// Grows by set union across repeat uploads, never shrinks.
    pub file_names: BTreeSet<String>,
    pub summary: SummaryState,
}

impl DocumentEntry {
    /// Initial shape persisted by the conditional create, before the
    /// summarizer has been called.
    pub fn pending(key: DocumentKey, file_size: u64, file_name: impl Into<String>) -> Self {
        Self {
            key,
            file_size,
            file_names: BTreeSet::from([file_name.into()]),
            summary: SummaryState::Pending,
        }
    }

    /// Merge a filename into the provenance set. Returns `true` if the
    /// name was not already present.
    pub fn merge_file_name(&mut self, file_name: impl Into<String>) -> bool {
        self.file_names.insert(file_name.into())
    }
}
