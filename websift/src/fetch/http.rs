//! reqwest-backed [`Fetcher`].

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::headers::request_headers;
use crate::config::FetchConfig;
use crate::errors::{FetchError, WebsiftError};
use crate::protocols::{FetchResult, Fetcher};

/// HTTP fetcher with browser-like headers, proxy support and retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Creates a fetcher from a fetch configuration.
    pub fn new(config: FetchConfig) -> Result<Self, WebsiftError> {
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };

        let mut builder = Client::builder()
            .redirect(redirect)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl);

        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| WebsiftError::Config(format!("Invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| WebsiftError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, WebsiftError> {
        Self::new(FetchConfig::default())
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_once(
        &self,
        url: &str,
        timeout: Option<Duration>,
        headers: &HashMap<String, String>,
    ) -> Result<FetchResult, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in request_headers(url, Some(headers)) {
            request = request.header(name, value);
        }
        if let Some(t) = timeout {
            request = request.timeout(t);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.classify(url, timeout, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(url, status.as_u16()));
        }

        let limit = self.config.max_response_size;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::network(url, format!("Response exceeds {limit} bytes")));
        }

        let response_headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let content_type = response_headers.get("content-type").cloned();
        let final_url = response.url().to_string();

        let body = response.bytes().await.map_err(|e| self.classify(url, timeout, &e))?;
        if body.len() > limit {
            return Err(FetchError::network(url, format!("Response exceeds {limit} bytes")));
        }

        Ok(FetchResult {
            status_code: status.as_u16(),
            headers: response_headers,
            body: body.to_vec(),
            final_url,
            content_type,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn classify(&self, url: &str, timeout: Option<Duration>, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            let budget = timeout.unwrap_or_else(|| self.config.timeout());
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            FetchError::network(url, err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Option<Duration>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<FetchResult, FetchError> {
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut merged = self.config.headers.clone();
        if let Some(h) = headers {
            merged.extend(h.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            match self.fetch_once(url, timeout, &merged).await {
                Ok(result) => {
                    debug!(
                        url = %url,
                        status = result.status_code,
                        duration_ms = result.duration_ms,
                        attempt,
                        "Fetch succeeded"
                    );
                    return Ok(result);
                }
                Err(e) if attempt < retry.max_retries && e.is_retryable(retry) => {
                    let delay = retry.delay_for_attempt(attempt);
                    debug!(url = %url, error = %e, attempt, delay = ?delay, "Retrying fetch");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, attempts = attempt + 1, "Fetch failed");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use pretty_assertions::assert_eq;

    fn fast_retry(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            retry_delay_seconds: 0.01,
            max_delay_seconds: 0.01,
            ..RetryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetches_html_with_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", mockito::Matcher::Regex("^Mozilla/5.0".to_string()))
            .match_header("referer", mockito::Matcher::Regex("google.com/search".to_string()))
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<p>hello</p>")
            .create_async()
            .await;

        let fetcher = HttpFetcher::with_defaults().unwrap();
        let url = format!("{}/page", server.url());
        let result = fetcher.fetch(&url, None, None).await.unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, b"<p>hello</p>".to_vec());
        assert!(result.is_html());
        assert_eq!(result.final_url, url);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_caller_headers_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/h")
            .match_header("x-trace", "42")
            .match_header("x-config", "yes")
            .with_status(200)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(FetchConfig::new().with_header("X-Config", "yes")).unwrap();
        let mut headers = HashMap::new();
        headers.insert("X-Trace".to_string(), "42".to_string());
        fetcher
            .fetch(&format!("{}/h", server.url()), None, Some(&headers))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/missing").with_status(404).create_async().await;

        let fetcher = HttpFetcher::new(FetchConfig::new().with_retry(RetryConfig::disabled())).unwrap();
        let url = format!("{}/missing", server.url());
        let err = fetcher.fetch(&url, None, None).await.unwrap_err();
        assert_eq!(err, FetchError::status(url, 404));
    }

    #[tokio::test]
    async fn test_retries_retryable_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(FetchConfig::new().with_retry(fast_retry(2))).unwrap();
        let err = fetcher
            .fetch(&format!("{}/flaky", server.url()), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/forbidden")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(FetchConfig::new().with_retry(fast_retry(3))).unwrap();
        let _ = fetcher
            .fetch(&format!("{}/forbidden", server.url()), None, None)
            .await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_follows_redirects() {
        let mut server = mockito::Server::new_async().await;
        let _from = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", "/new")
            .create_async()
            .await;
        let _to = server
            .mock("GET", "/new")
            .with_status(200)
            .with_body("moved")
            .create_async()
            .await;

        let fetcher = HttpFetcher::with_defaults().unwrap();
        let result = fetcher
            .fetch(&format!("{}/old", server.url()), None, None)
            .await
            .unwrap();
        assert_eq!(result.text(), "moved");
        assert!(result.final_url.ends_with("/new"));
    }

    #[tokio::test]
    async fn test_rejects_oversized_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big")
            .with_status(200)
            .with_body("x".repeat(64))
            .create_async()
            .await;

        let config = FetchConfig {
            max_response_size: 16,
            retry: RetryConfig::disabled(),
            ..FetchConfig::default()
        };
        let fetcher = HttpFetcher::new(config).unwrap();
        let err = fetcher
            .fetch(&format!("{}/big", server.url()), None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds 16 bytes"));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = HttpFetcher::with_defaults().unwrap();
        let err = fetcher.fetch("not a url", None, None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let err = HttpFetcher::new(FetchConfig::new().with_proxy("::not a proxy::")).unwrap_err();
        assert!(matches!(err, WebsiftError::Config(_)));
    }
}
