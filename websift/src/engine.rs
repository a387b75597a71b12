//! Single-query search against one provider or the `Auto` fan-out.

use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::errors::FetchError;
use crate::events::{EventSink, NoOpEventSink, SEARCH_PROVIDER_FAILED};
use crate::models::Provider;
use crate::pool::WorkerPool;
use crate::protocols::Fetcher;

/// Chooses the two providers an `Auto` search fans out to.
pub type ProviderPicker = Arc<dyn Fn() -> [Provider; 2] + Send + Sync>;

/// Picks two distinct concrete providers uniformly at random.
#[must_use]
pub fn random_provider_pair() -> [Provider; 2] {
    let mut rng = rand::thread_rng();
    let mut picked = Provider::CONCRETE.choose_multiple(&mut rng, 2).copied();
    match (picked.next(), picked.next()) {
        (Some(a), Some(b)) => [a, b],
        _ => [Provider::Google, Provider::Bing],
    }
}

/// Runs searches through a [`Fetcher`] and the provider parsers.
///
/// Cloning is cheap; clones share the fetcher and event sink.
#[derive(Clone)]
pub struct SearchEngine {
    fetcher: Arc<dyn Fetcher>,
    provider: Provider,
    max_search_workers: usize,
    fetch_timeout: Option<Duration>,
    picker: ProviderPicker,
    events: Arc<dyn EventSink>,
}

impl SearchEngine {
    /// Creates an engine with the default provider (`Auto`).
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::from_config(fetcher, &SearchConfig::default())
    }

    /// Creates an engine from a search configuration.
    #[must_use]
    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &SearchConfig) -> Self {
        Self {
            fetcher,
            provider: config.provider,
            max_search_workers: config.max_search_workers,
            fetch_timeout: None,
            picker: Arc::new(random_provider_pair),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the provider used by bulk search.
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the upper bound on concurrent query workers.
    #[must_use]
    pub fn with_max_search_workers(mut self, workers: usize) -> Self {
        self.max_search_workers = workers;
        self
    }

    /// Sets a per-request timeout passed to the fetcher.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Replaces the random `Auto` provider choice.
    #[must_use]
    pub fn with_provider_picker<F>(mut self, picker: F) -> Self
    where
        F: Fn() -> [Provider; 2] + Send + Sync + 'static,
    {
        self.picker = Arc::new(picker);
        self
    }

    /// Sets the event sink for absorbed failures.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// The provider used by bulk search.
    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The upper bound on concurrent query workers.
    #[must_use]
    pub fn max_search_workers(&self) -> usize {
        self.max_search_workers
    }

    pub(crate) fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Searches `query` and returns at most `max_results` normalized URLs.
    ///
    /// With a concrete provider, fetch failures are returned. `Auto` never
    /// fails: providers that fail contribute nothing.
    pub async fn search(
        &self,
        query: &str,
        provider: Provider,
        max_results: usize,
    ) -> Result<Vec<String>, FetchError> {
        if provider == Provider::Auto {
            return Ok(self.search_auto(query, max_results).await);
        }
        self.search_provider(query, provider, max_results).await
    }

    async fn search_provider(
        &self,
        query: &str,
        provider: Provider,
        max_results: usize,
    ) -> Result<Vec<String>, FetchError> {
        let (Some(url), Some(parser)) = (provider.search_url(query, max_results), provider.parser())
        else {
            return Ok(Vec::new());
        };

        debug!(query = %query, provider = %provider, url = %url, "Fetching result page");
        let response = self.fetcher.fetch(&url, self.fetch_timeout, None).await?;

        let mut urls = parser.parse(&response.body);
        debug!(
            query = %query,
            provider = %provider,
            parsed = urls.len(),
            "Parsed result page"
        );
        urls.truncate(max_results);
        Ok(urls)
    }

    async fn search_auto(&self, query: &str, max_results: usize) -> Vec<String> {
        let chosen = (self.picker)();
        debug!(query = %query, providers = ?chosen, "Auto search");

        let mut pool = WorkerPool::new("auto-search", 2);
        for provider in chosen {
            let engine = self.clone();
            let query = query.to_string();
            pool.spawn(async move {
                let result = engine.search_provider(&query, provider, max_results).await;
                (provider, result)
            });
        }

        let mut merged = Vec::new();
        for joined in pool.join_completed().await {
            match joined {
                Ok((_, Ok(urls))) => merged.extend(urls),
                Ok((provider, Err(e))) => {
                    warn!(query = %query, provider = %provider, error = %e, "Provider search failed");
                    self.events.try_emit(
                        SEARCH_PROVIDER_FAILED,
                        Some(serde_json::json!({
                            "query": query,
                            "provider": provider.as_str(),
                            "error": e.to_string(),
                        })),
                    );
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Provider search worker failed");
                    self.events.try_emit(
                        SEARCH_PROVIDER_FAILED,
                        Some(serde_json::json!({ "query": query, "error": e.to_string() })),
                    );
                }
            }
        }

        let mut urls = dedupe(merged);
        urls.truncate(max_results);
        urls
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("provider", &self.provider)
            .field("max_search_workers", &self.max_search_workers)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

/// Drops repeated URLs, keeping the first occurrence.
fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(urls.len());
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::testing::StubFetcher;
    use pretty_assertions::assert_eq;

    fn bing_page(links: &[&str]) -> String {
        links
            .iter()
            .map(|l| format!(r#"<li><h2><a href="{l}">r</a></h2></li>"#))
            .collect()
    }

    fn ddg_page(links: &[&str]) -> String {
        links
            .iter()
            .map(|l| format!(r#"<div><h2>r</h2><a href="{l}">r</a></div>"#))
            .collect()
    }

    #[tokio::test]
    async fn test_concrete_search_caps_results() {
        let fetcher = StubFetcher::new().with_body(
            "www.bing.com",
            bing_page(&["https://a.test", "https://b.test", "https://c.test", "https://d.test"]),
        );
        let engine = SearchEngine::new(Arc::new(fetcher));

        let urls = engine.search("rust", Provider::Bing, 2).await.unwrap();
        assert_eq!(urls, vec!["https://a.test", "https://b.test"]);
    }

    #[tokio::test]
    async fn test_concrete_search_fetches_provider_url() {
        let fetcher = Arc::new(StubFetcher::new().with_body("google.com", ""));
        let engine = SearchEngine::new(fetcher.clone());

        let urls = engine.search("lion king", Provider::Google, 5).await.unwrap();
        assert!(urls.is_empty());
        assert_eq!(
            fetcher.calls(),
            vec!["https://www.google.com/search?udm=14&q=lion%20king&num=5"]
        );
    }

    #[tokio::test]
    async fn test_concrete_search_propagates_fetch_error() {
        let fetcher = StubFetcher::new().with_status("search.yahoo.com", 503);
        let engine = SearchEngine::new(Arc::new(fetcher));

        let err = engine.search("q", Provider::Yahoo, 3).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_zero_results_requested() {
        let fetcher = StubFetcher::new().with_body("bing.com", bing_page(&["https://a.test"]));
        let engine = SearchEngine::new(Arc::new(fetcher));
        assert!(engine.search("q", Provider::Bing, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auto_merges_and_dedupes() {
        let fetcher = StubFetcher::new()
            .with_body("bing.com", bing_page(&["https://a.test", "https://b.test"]))
            .with_body_after(
                "duckduckgo.com",
                ddg_page(&["https://b.test", "https://c.test"]),
                Duration::from_millis(50),
            );
        let engine = SearchEngine::new(Arc::new(fetcher))
            .with_provider_picker(|| [Provider::DuckDuckGo, Provider::Bing]);

        let urls = engine.search("q", Provider::Auto, 10).await.unwrap();
        assert_eq!(urls, vec!["https://a.test", "https://b.test", "https://c.test"]);
    }

    #[tokio::test]
    async fn test_auto_survives_one_failing_provider() {
        let sink = Arc::new(CollectingEventSink::new());
        let fetcher = StubFetcher::new()
            .with_network_error("google.com")
            .with_body("bing.com", bing_page(&["https://u1.test", "https://u2.test", "https://u3.test"]));
        let engine = SearchEngine::new(Arc::new(fetcher))
            .with_provider_picker(|| [Provider::Google, Provider::Bing])
            .with_event_sink(sink.clone());

        let urls = engine.search("q", Provider::Auto, 2).await.unwrap();
        assert_eq!(urls, vec!["https://u1.test", "https://u2.test"]);
        assert_eq!(sink.events_of_type(SEARCH_PROVIDER_FAILED).len(), 1);
    }

    #[tokio::test]
    async fn test_auto_all_failing_is_empty() {
        let fetcher = StubFetcher::new();
        let engine = SearchEngine::new(Arc::new(fetcher))
            .with_provider_picker(|| [Provider::Yahoo, Provider::Google]);

        let urls = engine.search("q", Provider::Auto, 5).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_auto_uses_two_distinct_providers() {
        let fetcher = Arc::new(StubFetcher::new());
        let engine = SearchEngine::new(fetcher.clone());

        let _ = engine.search("q", Provider::Auto, 3).await;
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0], calls[1]);
    }

    #[test]
    fn test_random_pair_is_distinct_and_concrete() {
        for _ in 0..50 {
            let [a, b] = random_provider_pair();
            assert_ne!(a, b);
            assert!(a.is_concrete() && b.is_concrete());
        }
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let urls = dedupe(vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()]);
        assert_eq!(urls, vec!["b", "a", "c"]);
    }
}
