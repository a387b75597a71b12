//! Search-then-extract pipeline facade.

use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{ExtractionConfig, SearchConfig};
use crate::engine::SearchEngine;
use crate::events::{EventSink, NoOpEventSink, PIPELINE_COMPLETED};
use crate::extractor::ContentExtractor;
use crate::models::ExtractionRecord;

#[cfg(all(feature = "http", feature = "convert"))]
use crate::{config::PipelineConfig, errors::WebsiftError};

/// Runs bulk search, then ranked bulk extraction over every result URL.
#[derive(Clone)]
pub struct SearchPipeline {
    engine: SearchEngine,
    extractor: ContentExtractor,
    extraction: ExtractionConfig,
    results_per_query: usize,
    events: Arc<dyn EventSink>,
}

impl SearchPipeline {
    /// Creates a pipeline from an engine and an extractor.
    ///
    /// Extraction produces clean text capped at 4096 characters.
    #[must_use]
    pub fn new(engine: SearchEngine, extractor: ContentExtractor) -> Self {
        Self {
            engine,
            extractor,
            extraction: ExtractionConfig::default(),
            results_per_query: SearchConfig::default().results_per_query,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Builds a pipeline with the HTTP fetcher and markdown converter.
    ///
    /// Events are logged at debug level.
    #[cfg(all(feature = "http", feature = "convert"))]
    pub fn from_config(config: &PipelineConfig) -> Result<Self, WebsiftError> {
        use crate::convert::MarkdownConverter;
        use crate::events::LoggingEventSink;
        use crate::fetch::HttpFetcher;

        let fetcher: Arc<dyn crate::protocols::Fetcher> =
            Arc::new(HttpFetcher::new(config.fetch.clone())?);
        let engine = SearchEngine::from_config(fetcher.clone(), &config.search);
        let extractor = ContentExtractor::new(fetcher, Arc::new(MarkdownConverter::new()))
            .with_config(&config.extraction);

        Ok(Self::new(engine, extractor)
            .with_extraction(config.extraction.clone())
            .with_results_per_query(config.search.results_per_query)
            .with_event_sink(Arc::new(LoggingEventSink::debug())))
    }

    /// Overrides the content form and character cap used for extraction.
    #[must_use]
    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    /// Sets the number of results requested per query by [`run_default`](Self::run_default).
    #[must_use]
    pub fn with_results_per_query(mut self, results: usize) -> Self {
        self.results_per_query = results;
        self
    }

    /// Sets the event sink on the pipeline and both stages.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.engine = self.engine.with_event_sink(sink.clone());
        self.extractor = self.extractor.with_event_sink(sink.clone());
        self.events = sink;
        self
    }

    /// The search engine.
    #[must_use]
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// The content extractor.
    #[must_use]
    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    /// The configured number of results per query.
    #[must_use]
    pub fn results_per_query(&self) -> usize {
        self.results_per_query
    }

    /// Runs with the configured number of results per query.
    pub async fn run_default(&self, queries: &[String]) -> Vec<ExtractionRecord> {
        self.run(queries, self.results_per_query).await
    }

    /// Searches every query, then extracts and ranks all result URLs.
    ///
    /// Never fails: queries and URLs that fail are left out of the result.
    pub async fn run(&self, queries: &[String], results_per_query: usize) -> Vec<ExtractionRecord> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id, queries = queries.len());

        async {
            let urls = self.engine.search_combined(queries, results_per_query).await;
            let records = self
                .extractor
                .bulk_extract(&urls, self.extraction.content_type, self.extraction.max_chars)
                .await;

            info!(urls = urls.len(), records = records.len(), "Pipeline completed");
            self.events
                .emit(
                    PIPELINE_COMPLETED,
                    Some(serde_json::json!({
                        "run_id": run_id.to_string(),
                        "queries": queries.len(),
                        "urls": urls.len(),
                        "records": records.len(),
                    })),
                )
                .await;
            records
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for SearchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPipeline")
            .field("engine", &self.engine)
            .field("extractor", &self.extractor)
            .field("extraction", &self.extraction)
            .field("results_per_query", &self.results_per_query)
            .finish_non_exhaustive()
    }
}

/// Runs a pipeline with default configuration.
#[cfg(all(feature = "http", feature = "convert"))]
pub async fn run_pipeline(
    queries: &[String],
    results_per_query: usize,
) -> Result<Vec<ExtractionRecord>, WebsiftError> {
    let pipeline = SearchPipeline::from_config(&PipelineConfig::default())?;
    Ok(pipeline.run(queries, results_per_query).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::models::{ContentType, Provider};
    use crate::testing::{StubConverter, StubFetcher};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn pipeline(fetcher: StubFetcher) -> SearchPipeline {
        let fetcher: Arc<dyn crate::protocols::Fetcher> = Arc::new(fetcher);
        let engine = SearchEngine::new(fetcher.clone()).with_provider(Provider::Bing);
        let extractor = ContentExtractor::new(fetcher, Arc::new(StubConverter::new()));
        SearchPipeline::new(engine, extractor)
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_ranking() {
        let sink = Arc::new(CollectingEventSink::new());
        let fetcher = StubFetcher::new()
            .with_body("bing.com/search?q=a&", r#"<h2><a href="https://x.test">x</a></h2>"#)
            .with_body_after(
                "bing.com/search?q=b&",
                r#"<h2><a href="https://y.test">y</a></h2>"#,
                Duration::from_millis(20),
            )
            .with_body("https://x.test", "x".repeat(50))
            .with_body("https://y.test", "y".repeat(120));
        let pipeline = pipeline(fetcher).with_event_sink(sink.clone());

        let records = pipeline.run(&queries(&["a", "b"]), 1).await;
        assert_eq!(
            records,
            vec![
                ExtractionRecord::new("https://y.test", "y".repeat(120)),
                ExtractionRecord::new("https://x.test", "x".repeat(50)),
            ]
        );
        assert_eq!(sink.events_of_type(PIPELINE_COMPLETED).len(), 1);
    }

    #[tokio::test]
    async fn test_caps_content_and_cleans_whitespace() {
        let fetcher = StubFetcher::new()
            .with_body("bing.com", r#"<h2><a href="https://long.test/doc">d</a></h2>"#)
            .with_body("https://long.test/doc", "word\n\n ".repeat(2000));

        let records = pipeline(fetcher).run(&queries(&["q"]), 3).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].char_len(), 4096);
        assert!(!records[0].content.contains('\n'));
    }

    #[tokio::test]
    async fn test_custom_extraction() {
        let fetcher = StubFetcher::new()
            .with_body("bing.com", r#"<h2><a href="https://a.test">a</a></h2>"#)
            .with_body("https://a.test", "line one\n\nline two");
        let extraction = ExtractionConfig {
            content_type: ContentType::Markdown,
            max_chars: None,
            ..ExtractionConfig::default()
        };

        let records = pipeline(fetcher)
            .with_extraction(extraction)
            .run(&queries(&["q"]), 3)
            .await;
        assert_eq!(records[0].content, "line one\n\nline two");
    }

    #[tokio::test]
    async fn test_failures_yield_partial_results() {
        let fetcher = StubFetcher::new()
            .with_network_error("bing.com/search?q=down&")
            .with_body(
                "bing.com/search?q=up&",
                r#"<h2><a href="https://ok.test">1</a></h2><h2><a href="https://dead.test">2</a></h2>"#,
            )
            .with_body("https://ok.test", "content")
            .with_status("https://dead.test", 500);

        let records = pipeline(fetcher).run(&queries(&["down", "up"]), 3).await;
        assert_eq!(records, vec![ExtractionRecord::new("https://ok.test", "content")]);
    }

    #[tokio::test]
    async fn test_run_default_uses_configured_results() {
        let fetcher = StubFetcher::new()
            .with_body(
                "bing.com",
                r#"<h2><a href="https://one.test">1</a></h2><h2><a href="https://two.test">2</a></h2>"#,
            )
            .with_body("https://one.test", "first")
            .with_body("https://two.test", "second");

        let records = pipeline(fetcher)
            .with_results_per_query(1)
            .run_default(&queries(&["q"]))
            .await;
        assert_eq!(records, vec![ExtractionRecord::new("https://one.test", "first")]);
    }

    #[tokio::test]
    async fn test_logging_sink_receives_pipeline_events() {
        let fetcher = StubFetcher::new()
            .with_body("bing.com", r#"<h2><a href="https://a.test">a</a></h2>"#)
            .with_body("https://a.test", "text");
        let records = pipeline(fetcher)
            .with_event_sink(Arc::new(crate::events::LoggingEventSink::debug()))
            .run(&queries(&["q"]), 1)
            .await;
        assert_eq!(records.len(), 1);
    }

    #[cfg(all(feature = "http", feature = "convert"))]
    #[test]
    fn test_from_config_reads_results_per_query() {
        let config = PipelineConfig::from_json_str(r#"{"search": {"results_per_query": 5}}"#).unwrap();
        let pipeline = SearchPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.results_per_query(), 5);
        assert_eq!(
            SearchPipeline::from_config(&PipelineConfig::default())
                .unwrap()
                .results_per_query(),
            3
        );
    }

    #[tokio::test]
    async fn test_empty_queries() {
        let records = pipeline(StubFetcher::new()).run(&[], 3).await;
        assert!(records.is_empty());
    }
}
