//! HTTP summarizer adapter.
//!
//! POSTs the raw document bytes to a configured endpoint and expects a JSON
//! body of the form `{"summary": "..."}`. The filename travels in the
//! `x-file-name` header and the optional model selector as a `model` query
//! parameter. Which summarization backend sits behind the endpoint is out
//! of scope here; this adapter is the generic seam the workflow plugs into.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::stores::{Summarizer, SummarizerError};

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

/// [`Summarizer`] backed by a remote HTTP service.
#[derive(Clone, Debug)]
pub struct HttpSummarizer {
    client: Client,
    endpoint: Url,
}

impl HttpSummarizer {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Use a pre-configured client (custom timeouts, proxies, TLS).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    #[instrument(skip(self, bytes), fields(len = bytes.len()), err)]
    async fn summarize(
        &self,
        bytes: &[u8],
        file_name: &str,
        model_hint: Option<&str>,
    ) -> Result<String, SummarizerError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("x-file-name", file_name)
            .body(bytes.to_vec());
        if let Some(model) = model_hint {
            request = request.query(&[("model", model)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SummarizerError::Transport {
                message: e.to_string(),
            })?;

        let response = response
            .error_for_status()
            .map_err(|e| SummarizerError::Upstream {
                message: e.to_string(),
            })?;

        let body: SummaryResponse =
            response
                .json()
                .await
                .map_err(|e| SummarizerError::Upstream {
                    message: format!("malformed summary response: {e}"),
                })?;

        Ok(body.summary)
    }
}
