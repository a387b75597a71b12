//! Yahoo result-page parser.

use super::{collect_links, elements_named, first_child_href, parse_document, ResultParser};

/// Class attribute Yahoo puts on result title containers.
const RESULT_CLASS: &str = "d-ib v-v";

/// Parses Yahoo result pages.
///
/// Only `div`s whose `class` attribute is exactly `d-ib v-v` are considered.
/// Their anchors point at `r.search.yahoo.com` redirects, which normalization
/// unwraps.
#[derive(Debug, Clone, Copy, Default)]
pub struct YahooParser;

impl ResultParser for YahooParser {
    fn parse(&self, body: &[u8]) -> Vec<String> {
        let doc = parse_document(body);
        let hrefs = elements_named(&doc, "div")
            .filter(|div| div.value().attr("class") == Some(RESULT_CLASS))
            .filter_map(first_child_href);
        collect_links(hrefs)
    }
}
