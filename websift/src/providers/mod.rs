//! Search providers and their result-page parsers.
//!
//! Each concrete [`Provider`] owns a search URL template and a
//! [`ResultParser`] that pulls result links out of the returned HTML. Parsers
//! never fail: markup they do not recognise yields an empty list.

mod bing;
mod duckduckgo;
mod google;
mod yahoo;

pub use bing::BingParser;
pub use duckduckgo::DuckDuckGoParser;
pub use google::GoogleParser;
pub use yahoo::YahooParser;

use scraper::{ElementRef, Html};
use std::collections::HashSet;

pub use crate::models::Provider;
use crate::normalize::normalize_url;

/// Extracts result links from a provider's result page.
pub trait ResultParser: Send + Sync {
    /// Parses a raw result page into normalized, deduplicated URLs.
    fn parse(&self, body: &[u8]) -> Vec<String>;
}

static GOOGLE: GoogleParser = GoogleParser;
static BING: BingParser = BingParser;
static YAHOO: YahooParser = YahooParser;
static DUCKDUCKGO: DuckDuckGoParser = DuckDuckGoParser;

impl Provider {
    /// Returns the parser for a concrete provider, `None` for `Auto`.
    #[must_use]
    pub fn parser(self) -> Option<&'static dyn ResultParser> {
        match self {
            Self::Google => Some(&GOOGLE),
            Self::Bing => Some(&BING),
            Self::Yahoo => Some(&YAHOO),
            Self::DuckDuckGo => Some(&DUCKDUCKGO),
            Self::Auto => None,
        }
    }

    /// Builds the result-page URL for a query, `None` for `Auto`.
    #[must_use]
    pub fn search_url(self, query: &str, max_results: usize) -> Option<String> {
        let q = urlencoding::encode(query);
        let url = match self {
            Self::Google => format!("https://www.google.com/search?udm=14&q={q}&num={max_results}"),
            Self::Bing => format!("https://www.bing.com/search?q={q}&count={max_results}"),
            Self::Yahoo => format!("https://search.yahoo.com/search?q={q}&n={max_results}"),
            Self::DuckDuckGo => {
                format!("https://www.duckduckgo.com/html/?q={q}&num={max_results}")
            }
            Self::Auto => return None,
        };
        Some(url)
    }
}

pub(crate) fn parse_document(body: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(body))
}

/// All elements with the given tag name, in document order.
pub(crate) fn elements_named<'a>(
    doc: &'a Html,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

/// Direct child elements with the given tag name.
pub(crate) fn children_named<'a>(
    el: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

/// The `href` of the first direct-child anchor that has one.
pub(crate) fn first_child_href<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    children_named(el, "a").find_map(|a| a.value().attr("href"))
}

/// Normalizes candidate hrefs, keeping first-seen `http` links only.
pub(crate) fn collect_links<'a, I>(hrefs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for href in hrefs {
        if href.is_empty() {
            continue;
        }
        let url = normalize_url(href);
        if url.starts_with("http") && seen.insert(url.clone()) {
            links.push(url);
        }
    }
    links
}
