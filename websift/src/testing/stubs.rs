//! Stub collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::{ConversionError, FetchError};
use crate::protocols::{DocumentConverter, FetchResult, Fetcher};

#[derive(Debug, Clone)]
enum Outcome {
    Body(Vec<u8>),
    Network,
    Status(u16),
    Panic,
}

#[derive(Debug, Clone)]
struct Route {
    pattern: String,
    outcome: Outcome,
    delay: Duration,
}

/// A fetcher answering from in-memory routes.
///
/// A route matches when its pattern equals the URL or is contained in it;
/// exact matches win, then routes are tried in the order they were added.
/// Unmatched URLs fail with a 404 status.
#[derive(Debug, Default)]
pub struct StubFetcher {
    routes: Vec<Route>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    /// Creates a fetcher with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn route(mut self, pattern: impl Into<String>, outcome: Outcome, delay: Duration) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            outcome,
            delay,
        });
        self
    }

    /// Answers matching URLs with `body`.
    #[must_use]
    pub fn with_body(self, pattern: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.route(pattern, Outcome::Body(body.into()), Duration::ZERO)
    }

    /// Answers matching URLs with `body` after sleeping for `delay`.
    #[must_use]
    pub fn with_body_after(
        self,
        pattern: impl Into<String>,
        body: impl Into<Vec<u8>>,
        delay: Duration,
    ) -> Self {
        self.route(pattern, Outcome::Body(body.into()), delay)
    }

    /// Fails matching URLs with a network error.
    #[must_use]
    pub fn with_network_error(self, pattern: impl Into<String>) -> Self {
        self.route(pattern, Outcome::Network, Duration::ZERO)
    }

    /// Fails matching URLs with a non-2xx status.
    #[must_use]
    pub fn with_status(self, pattern: impl Into<String>, status: u16) -> Self {
        self.route(pattern, Outcome::Status(status), Duration::ZERO)
    }

    /// Panics when a matching URL is fetched.
    #[must_use]
    pub fn with_panic(self, pattern: impl Into<String>) -> Self {
        self.route(pattern, Outcome::Panic, Duration::ZERO)
    }

    /// Returns every URL fetched so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Returns the number of fetches.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn find(&self, url: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.pattern == url)
            .or_else(|| self.routes.iter().find(|r| url.contains(&r.pattern)))
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        url: &str,
        _timeout: Option<Duration>,
        _headers: Option<&HashMap<String, String>>,
    ) -> Result<FetchResult, FetchError> {
        self.calls.lock().push(url.to_string());

        let Some(route) = self.find(url) else {
            return Err(FetchError::status(url, 404));
        };
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match &route.outcome {
            Outcome::Body(body) => Ok(FetchResult {
                content_type: Some("text/html".to_string()),
                ..FetchResult::ok(url, body.clone())
            }),
            Outcome::Network => Err(FetchError::network(url, "connection refused")),
            Outcome::Status(status) => Err(FetchError::status(url, *status)),
            Outcome::Panic => panic!("stub fetcher asked to panic for {url}"),
        }
    }
}

/// A converter that returns the body as text unchanged.
#[derive(Debug, Default)]
pub struct StubConverter {
    fail_marker: Option<String>,
    panic_marker: Option<String>,
    delay: Duration,
    call_count: Mutex<usize>,
}

impl StubConverter {
    /// Creates a pass-through converter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails conversion of any body containing `marker`.
    #[must_use]
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Panics while converting any body containing `marker`.
    #[must_use]
    pub fn panicking_on(mut self, marker: impl Into<String>) -> Self {
        self.panic_marker = Some(marker.into());
        self
    }

    /// Blocks the calling thread for `delay` on every conversion.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of conversions performed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    fn convert(&self, body: &[u8]) -> Result<String, ConversionError> {
        *self.call_count.lock() += 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let text = String::from_utf8_lossy(body).into_owned();
        if let Some(marker) = self.panic_marker.as_deref().filter(|m| text.contains(m)) {
            panic!("stub converter asked to panic on {marker}");
        }
        match &self.fail_marker {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(ConversionError::new(format!("cannot convert body containing {marker}")))
            }
            _ => Ok(text),
        }
    }
}

impl DocumentConverter for StubConverter {
    fn to_markdown(&self, body: &[u8]) -> Result<String, ConversionError> {
        self.convert(body)
    }

    fn to_plain_text(&self, body: &[u8]) -> Result<String, ConversionError> {
        self.convert(body)
    }
}
