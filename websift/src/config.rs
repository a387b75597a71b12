//! Configuration types for fetching, searching and extraction.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::errors::WebsiftError;
use crate::models::{ContentType, Provider};

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of redirects to follow. Zero disables redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Proxy URL applied to every request.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Whether to verify SSL certificates.
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_size")]
    pub max_response_size: usize,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout() -> f64 {
    20.0
}

fn default_max_redirects() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_redirects: default_max_redirects(),
            proxy: None,
            verify_ssl: true,
            max_response_size: default_max_size(),
            headers: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Routes every request through a proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }
}

/// Retry configuration for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay() -> f64 {
    0.5
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    8.0
}

fn default_retry_status_codes() -> HashSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculates the delay for a given attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.retry_delay_seconds * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_seconds).max(0.0);
        Duration::from_secs_f64(capped)
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// Configuration for search and bulk search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider used by bulk search and the pipeline.
    #[serde(default)]
    pub provider: Provider,
    /// Number of results requested per query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,
    /// Upper bound on concurrent query workers.
    #[serde(default = "default_max_search_workers")]
    pub max_search_workers: usize,
}

fn default_results_per_query() -> usize {
    3
}

fn default_max_search_workers() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            results_per_query: default_results_per_query(),
            max_search_workers: default_max_search_workers(),
        }
    }
}

impl SearchConfig {
    /// Creates a new search configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the number of results requested per query.
    #[must_use]
    pub fn with_results_per_query(mut self, results: usize) -> Self {
        self.results_per_query = results;
        self
    }

    /// Sets the worker bound for bulk search.
    #[must_use]
    pub fn with_max_search_workers(mut self, workers: usize) -> Self {
        self.max_search_workers = workers;
        self
    }
}

/// Configuration for content extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Content form produced by the pipeline.
    #[serde(default = "default_content_type")]
    pub content_type: ContentType,
    /// Maximum characters kept per document.
    #[serde(default = "default_max_chars")]
    pub max_chars: Option<usize>,
    /// Per-fetch timeout override in seconds.
    #[serde(default)]
    pub fetch_timeout_seconds: Option<f64>,
}

fn default_content_type() -> ContentType {
    ContentType::Clean
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_chars() -> Option<usize> {
    Some(4096)
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            max_chars: default_max_chars(),
            fetch_timeout_seconds: None,
        }
    }
}

impl ExtractionConfig {
    /// Creates a new extraction configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, seconds: f64) -> Self {
        self.fetch_timeout_seconds = Some(seconds);
        self
    }

    /// Per-fetch timeout as Duration, if configured.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_seconds
            .map(|s| Duration::from_secs_f64(s.max(0.0)))
    }
}

/// Combined configuration for a search pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Search configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Extraction configuration.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl PipelineConfig {
    /// Creates a new pipeline configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, WebsiftError> {
        serde_json::from_str(json).map_err(|e| WebsiftError::Config(e.to_string()))
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Sets the search configuration.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout_seconds, 20.0);
        assert_eq!(config.max_redirects, 10);
        assert!(config.verify_ssl);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::new()
            .with_timeout(5.0)
            .with_proxy("http://127.0.0.1:8080")
            .with_header("X-Trace", "1");

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.headers.get("X-Trace"), Some(&"1".to_string()));
    }

    #[test]
    fn test_retry_config_delay() {
        let config = RetryConfig::default();

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_status_codes() {
        let config = RetryConfig::default();

        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(200));
        assert!(!config.should_retry_status(404));
        assert_eq!(RetryConfig::disabled().max_retries, 0);
    }

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.provider, Provider::Auto);
        assert_eq!(config.results_per_query, 3);
        assert_eq!(config.max_search_workers, 10);
    }

    #[test]
    fn test_extraction_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.content_type, ContentType::Clean);
        assert_eq!(config.max_chars, Some(4096));
        assert!(config.fetch_timeout().is_none());
        assert_eq!(
            config.with_fetch_timeout(2.5).fetch_timeout(),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let config = PipelineConfig::from_json_str(
            r#"{"search": {"provider": "bing", "results_per_query": 5}, "fetch": {"proxy": "socks5://proxy:1080"}}"#,
        )
        .unwrap();

        assert_eq!(config.search.provider, Provider::Bing);
        assert_eq!(config.search.results_per_query, 5);
        assert_eq!(config.search.max_search_workers, 10);
        assert_eq!(config.fetch.proxy.as_deref(), Some("socks5://proxy:1080"));
        assert_eq!(config.extraction.max_chars, Some(4096));
    }

    #[test]
    fn test_pipeline_config_invalid_json() {
        let err = PipelineConfig::from_json_str(r#"{"search": {"provider": "altavista"}}"#)
            .unwrap_err();
        assert!(matches!(err, WebsiftError::Config(_)));
    }
}
