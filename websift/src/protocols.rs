//! Protocol traits for the collaborators the pipeline consumes.
//!
//! Transport and document conversion sit behind these traits so that the
//! search and extraction coordinators can be driven by stubs in tests and by
//! [`HttpFetcher`](crate::fetch::HttpFetcher) /
//! [`MarkdownConverter`](crate::convert::MarkdownConverter) in production.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::errors::{ConversionError, FetchError};

/// Result of a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub final_url: String,
    /// Content type from headers.
    pub content_type: Option<String>,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

impl FetchResult {
    /// Creates a 200 response carrying `body`.
    #[must_use]
    pub fn ok(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code: 200,
            headers: HashMap::new(),
            body: body.into(),
            final_url: url.into(),
            content_type: None,
            duration_ms: 0.0,
        }
    }

    /// Whether the response is HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
    }

    /// Whether the response is a PDF, by content type or magic bytes.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.contains("application/pdf"))
            || is_pdf_bytes(&self.body)
    }

    /// Whether the fetch was successful (2xx status).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Whether `body` starts with the PDF magic bytes.
#[must_use]
pub fn is_pdf_bytes(body: &[u8]) -> bool {
    body.starts_with(b"%PDF-")
}

/// Protocol for HTTP fetching.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL and returns the result.
    ///
    /// Implementations return [`FetchError::Status`] for non-2xx responses, so
    /// an `Ok` result always carries a usable body.
    async fn fetch(
        &self,
        url: &str,
        timeout: Option<Duration>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<FetchResult, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(
        &self,
        url: &str,
        timeout: Option<Duration>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<FetchResult, FetchError> {
        (**self).fetch(url, timeout, headers).await
    }
}

/// Protocol for turning fetched bytes into text.
///
/// Implementations must accept both HTML and PDF bodies.
pub trait DocumentConverter: Send + Sync {
    /// Converts a document to markdown.
    fn to_markdown(&self, body: &[u8]) -> Result<String, ConversionError>;

    /// Converts a document to plain text.
    fn to_plain_text(&self, body: &[u8]) -> Result<String, ConversionError>;
}

impl<T: DocumentConverter + ?Sized> DocumentConverter for Arc<T> {
    fn to_markdown(&self, body: &[u8]) -> Result<String, ConversionError> {
        (**self).to_markdown(body)
    }

    fn to_plain_text(&self, body: &[u8]) -> Result<String, ConversionError> {
        (**self).to_plain_text(body)
    }
}

/// A fetched response with lazily computed, cached conversions.
pub struct FetchedDocument {
    result: FetchResult,
    converter: Arc<dyn DocumentConverter>,
    markdown: OnceLock<Result<String, ConversionError>>,
    plain_text: OnceLock<Result<String, ConversionError>>,
}

impl FetchedDocument {
    /// Wraps a fetch result with the converter used for its text forms.
    #[must_use]
    pub fn new(result: FetchResult, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            result,
            converter,
            markdown: OnceLock::new(),
            plain_text: OnceLock::new(),
        }
    }

    /// The underlying fetch result.
    #[must_use]
    pub fn result(&self) -> &FetchResult {
        &self.result
    }

    /// The URL the document was finally served from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.result.final_url
    }

    /// Markdown rendering, computed on first access.
    pub fn markdown(&self) -> Result<&str, ConversionError> {
        self.markdown
            .get_or_init(|| self.converter.to_markdown(&self.result.body))
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Plain text rendering, computed on first access.
    pub fn plain_text(&self) -> Result<&str, ConversionError> {
        self.plain_text
            .get_or_init(|| self.converter.to_plain_text(&self.result.body))
            .as_deref()
            .map_err(Clone::clone)
    }
}

impl std::fmt::Debug for FetchedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedDocument")
            .field("url", &self.result.final_url)
            .field("status_code", &self.result.status_code)
            .field("markdown_cached", &self.markdown.get().is_some())
            .field("plain_text_cached", &self.plain_text.get().is_some())
            .finish_non_exhaustive()
    }
}
