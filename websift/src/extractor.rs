//! Content extraction for single URLs and ranked bulk extraction.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::errors::{ConversionError, FailureKind, ItemFailure};
use crate::events::{EventSink, NoOpEventSink, EXTRACT_BATCH_COMPLETED, EXTRACT_URL_FAILED};
use crate::models::{ContentType, ExtractionRecord};
use crate::pool::WorkerPool;
use crate::protocols::{DocumentConverter, FetchedDocument, Fetcher};
use crate::text::{clean_text, truncate_chars};

/// Fetches URLs and converts them to text.
///
/// Cloning is cheap; clones share the fetcher, converter and event sink.
#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: Arc<dyn Fetcher>,
    converter: Arc<dyn DocumentConverter>,
    fetch_timeout: Option<Duration>,
    events: Arc<dyn EventSink>,
}

impl ContentExtractor {
    /// Creates an extractor from its collaborators.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            fetcher,
            converter,
            fetch_timeout: None,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Applies the fetch timeout from an extraction configuration.
    #[must_use]
    pub fn with_config(mut self, config: &ExtractionConfig) -> Self {
        self.fetch_timeout = config.fetch_timeout();
        self
    }

    /// Sets the per-fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Sets the event sink for absorbed failures.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Fetches `url` and extracts its content in the requested form.
    ///
    /// `max_chars = Some(k)` with `k > 0` keeps the first `k` characters.
    /// Failures are logged and reported to the event sink before being
    /// returned.
    pub async fn extract(
        &self,
        url: &str,
        content_type: ContentType,
        max_chars: Option<usize>,
    ) -> Result<ExtractionRecord, ItemFailure> {
        match self.extract_inner(url, content_type, max_chars).await {
            Ok(record) => Ok(record),
            Err(failure) => {
                self.report_failure(url, &failure);
                Err(failure)
            }
        }
    }

    async fn extract_inner(
        &self,
        url: &str,
        content_type: ContentType,
        max_chars: Option<usize>,
    ) -> Result<ExtractionRecord, ItemFailure> {
        let response = self.fetcher.fetch(url, self.fetch_timeout, None).await?;
        debug!(
            url = %url,
            status = response.status_code,
            bytes = response.body.len(),
            duration_ms = response.duration_ms,
            "Fetched document"
        );

        let converter = self.converter.clone();
        let content = tokio::task::spawn_blocking(move || {
            render(&FetchedDocument::new(response, converter), content_type)
        })
        .await
        .map_err(|e| {
            ItemFailure::new(FailureKind::Conversion, format!("Conversion task failed: {e}"))
        })??;

        Ok(ExtractionRecord::new(url, truncate_chars(content, max_chars)))
    }

    fn report_failure(&self, url: &str, failure: &ItemFailure) {
        warn!(url = %url, kind = %failure.kind, error = %failure.detail, "Extraction failed");
        self.events.try_emit(
            EXTRACT_URL_FAILED,
            Some(serde_json::json!({ "url": url, "error": failure.to_dict() })),
        );
    }

    /// Extracts every URL concurrently and ranks the successes.
    ///
    /// One worker runs per URL. Failed URLs are dropped. The result is sorted
    /// by content length in characters, longest first; equal lengths keep the
    /// order in which their workers finished.
    pub async fn bulk_extract(
        &self,
        urls: &[String],
        content_type: ContentType,
        max_chars: Option<usize>,
    ) -> Vec<ExtractionRecord> {
        if urls.is_empty() {
            return Vec::new();
        }

        let mut pool = WorkerPool::new("bulk-extract", urls.len());
        for url in urls {
            let extractor = self.clone();
            let url = url.clone();
            pool.spawn(async move {
                let result = extractor.extract(&url, content_type, max_chars).await;
                (url, result)
            });
        }

        let mut records = Vec::with_capacity(urls.len());
        for joined in pool.join_completed().await {
            match joined {
                Ok((_, Ok(record))) => records.push(record),
                Ok((_, Err(_))) => {}
                Err(e) => {
                    let failure = ItemFailure::worker(e.to_string());
                    warn!(error = %failure.detail, "Extraction worker failed");
                    self.events.try_emit(
                        EXTRACT_URL_FAILED,
                        Some(serde_json::json!({ "error": failure.to_dict() })),
                    );
                }
            }
        }

        rank_by_length(&mut records);

        info!(
            requested = urls.len(),
            extracted = records.len(),
            content_type = %content_type,
            "Bulk extraction completed"
        );
        self.events
            .emit(
                EXTRACT_BATCH_COMPLETED,
                Some(serde_json::json!({
                    "requested": urls.len(),
                    "extracted": records.len(),
                })),
            )
            .await;
        records
    }
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

/// Converts a document to the requested form. Runs on the blocking pool.
fn render(document: &FetchedDocument, content_type: ContentType) -> Result<String, ConversionError> {
    Ok(match content_type {
        ContentType::Markdown => document.markdown()?.to_string(),
        ContentType::PlainText => document.plain_text()?.to_string(),
        ContentType::Clean => clean_text(document.plain_text()?),
    })
}

/// Stable sort by character count, longest first.
pub fn rank_by_length(records: &mut [ExtractionRecord]) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(r.char_len()));
}
