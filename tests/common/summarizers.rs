use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sumvault::stores::{Summarizer, SummarizerError};

/// Summarizer that counts its invocations and answers with a canned
/// summary derived from the input, after an optional delay.
#[derive(Debug, Default)]
pub struct CountingSummarizer {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingSummarizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold each call open for `delay`, to widen the in-flight window in
    /// concurrency tests.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(
        &self,
        bytes: &[u8],
        _file_name: &str,
        model_hint: Option<&str>,
    ) -> Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(format!(
            "summary[{}] of {} bytes",
            model_hint.unwrap_or("default"),
            bytes.len()
        ))
    }
}

/// Summarizer that fails the first `fail_times` calls, then succeeds.
#[derive(Debug)]
pub struct FlakySummarizer {
    calls: AtomicUsize,
    fail_times: usize,
}

impl FlakySummarizer {
    pub fn failing_first(fail_times: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_times,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for FlakySummarizer {
    async fn summarize(
        &self,
        bytes: &[u8],
        _file_name: &str,
        _model_hint: Option<&str>,
    ) -> Result<String, SummarizerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            return Err(SummarizerError::Upstream {
                message: "upstream 503".to_string(),
            });
        }
        Ok(format!("recovered summary of {} bytes", bytes.len()))
    }
}
