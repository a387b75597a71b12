//! Data models for search results and extracted content.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ItemFailure;

/// A web search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google web results.
    Google,
    /// Bing web results.
    Bing,
    /// Yahoo web results.
    Yahoo,
    /// DuckDuckGo HTML results.
    #[serde(rename = "duckduckgo")]
    DuckDuckGo,
    /// Two randomly chosen concrete providers, merged.
    #[default]
    Auto,
}

impl Provider {
    /// Every provider that maps to a real search endpoint.
    pub const CONCRETE: [Self; 4] = [Self::Google, Self::Bing, Self::Yahoo, Self::DuckDuckGo];

    /// Returns the lowercase provider name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Bing => "bing",
            Self::Yahoo => "yahoo",
            Self::DuckDuckGo => "duckduckgo",
            Self::Auto => "auto",
        }
    }

    /// Whether this provider is backed by a single endpoint.
    #[must_use]
    pub fn is_concrete(self) -> bool {
        self != Self::Auto
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown search provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "bing" => Ok(Self::Bing),
            "yahoo" => Ok(Self::Yahoo),
            "duckduckgo" => Ok(Self::DuckDuckGo),
            "auto" => Ok(Self::Auto),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// The textual form produced by content extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Markdown rendering of the document.
    Markdown,
    /// Plain text with newline runs collapsed.
    PlainText,
    /// Plain text with every whitespace run collapsed to one space.
    Clean,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markdown => "markdown",
            Self::PlainText => "plain_text",
            Self::Clean => "clean",
        };
        f.write_str(name)
    }
}

/// Outcome of searching a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// The query exactly as supplied.
    pub query: String,
    /// Normalized result URLs, empty on failure.
    pub urls: Vec<String>,
    /// Failure detail when the search did not complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemFailure>,
}

impl SearchRecord {
    /// Creates a successful record.
    #[must_use]
    pub fn success(query: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            query: query.into(),
            urls,
            error: None,
        }
    }

    /// Creates a failed record with no URLs.
    #[must_use]
    pub fn failure(query: impl Into<String>, error: ItemFailure) -> Self {
        Self {
            query: query.into(),
            urls: Vec::new(),
            error: Some(error),
        }
    }

    /// Whether the search failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("query".to_string(), serde_json::json!(self.query));
        dict.insert("urls".to_string(), serde_json::json!(self.urls));
        if let Some(ref e) = self.error {
            dict.insert("error".to_string(), serde_json::json!(e.to_dict()));
        }
        dict
    }
}

/// Content extracted from one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// The source URL.
    pub url: String,
    /// Extracted text in the requested form.
    pub content: String,
}

impl ExtractionRecord {
    /// Creates a new extraction record.
    #[must_use]
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }

    /// Content length in characters, the ranking key.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Output of a bulk search, shaped by the `combine` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkSearchOutput {
    /// One record per query in input order.
    Records(Vec<SearchRecord>),
    /// Every URL flattened in query order.
    Combined(Vec<String>),
}

impl BulkSearchOutput {
    /// Returns the records, or `None` for combined output.
    #[must_use]
    pub fn into_records(self) -> Option<Vec<SearchRecord>> {
        match self {
            Self::Records(records) => Some(records),
            Self::Combined(_) => None,
        }
    }

    /// Returns the flattened URLs, flattening records if necessary.
    #[must_use]
    pub fn into_urls(self) -> Vec<String> {
        match self {
            Self::Records(records) => combine_records(records),
            Self::Combined(urls) => urls,
        }
    }

    /// Number of records or URLs held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Records(r) => r.len(),
            Self::Combined(u) => u.len(),
        }
    }

    /// Whether the output is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flattens records in query order, then within-query order.
///
/// Failed and empty records contribute nothing. Duplicates across queries are
/// kept.
#[must_use]
pub fn combine_records(records: Vec<SearchRecord>) -> Vec<String> {
    records
        .into_iter()
        .filter(|r| r.error.is_none())
        .flat_map(|r| r.urls)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_provider_round_trips_names() {
        for provider in Provider::CONCRETE {
            assert_eq!(provider.to_string().parse::<Provider>().unwrap(), provider);
        }
        assert_eq!("Auto".parse::<Provider>().unwrap(), Provider::Auto);
        assert!("altavista".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_serde_names() {
        let json = serde_json::to_string(&Provider::DuckDuckGo).unwrap();
        assert_eq!(json, "\"duckduckgo\"");
        let parsed: Provider = serde_json::from_str("\"yahoo\"").unwrap();
        assert_eq!(parsed, Provider::Yahoo);
    }

    #[test]
    fn test_provider_concrete() {
        assert!(!Provider::Auto.is_concrete());
        assert!(Provider::CONCRETE.iter().all(|p| p.is_concrete()));
        assert_eq!(Provider::default(), Provider::Auto);
    }

    #[test]
    fn test_content_type_serde() {
        let parsed: ContentType = serde_json::from_str("\"plain_text\"").unwrap();
        assert_eq!(parsed, ContentType::PlainText);
        assert_eq!(ContentType::Clean.to_string(), "clean");
    }

    #[test]
    fn test_search_record_to_dict() {
        let ok = SearchRecord::success("rust", vec!["https://a.test".to_string()]);
        let dict = ok.to_dict();
        assert_eq!(dict.get("query"), Some(&serde_json::json!("rust")));
        assert!(!dict.contains_key("error"));

        let failed = SearchRecord::failure("rust", ItemFailure::new(FailureKind::Transport, "reset"));
        assert!(failed.is_error());
        assert!(failed.urls.is_empty());
        assert!(failed.to_dict().contains_key("error"));
    }

    #[test]
    fn test_combine_records_skips_failures_and_keeps_duplicates() {
        let records = vec![
            SearchRecord::success("a", vec!["https://x.test".to_string()]),
            SearchRecord::failure("b", ItemFailure::worker("panicked")),
            SearchRecord::success("c", vec![]),
            SearchRecord::success(
                "d",
                vec!["https://x.test".to_string(), "https://y.test".to_string()],
            ),
        ];

        assert_eq!(
            combine_records(records),
            vec!["https://x.test", "https://x.test", "https://y.test"]
        );
    }

    #[test]
    fn test_extraction_record_char_len() {
        let record = ExtractionRecord::new("https://a.test", "héllo");
        assert_eq!(record.char_len(), 5);
    }

    #[test]
    fn test_bulk_output_into_urls() {
        let output = BulkSearchOutput::Records(vec![SearchRecord::success(
            "q",
            vec!["https://a.test".to_string()],
        )]);
        assert_eq!(output.len(), 1);
        assert_eq!(output.into_urls(), vec!["https://a.test"]);
        assert!(BulkSearchOutput::Combined(vec![]).is_empty());
    }
}
