//! DuckDuckGo result-page parser.

use super::{
    children_named, collect_links, elements_named, first_child_href, parse_document, ResultParser,
};

/// Parses the DuckDuckGo HTML endpoint.
///
/// Result containers are `div`s that directly hold an `h2`; the link is the
/// container's first direct anchor, usually a `uddg=` redirect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDuckGoParser;

impl ResultParser for DuckDuckGoParser {
    fn parse(&self, body: &[u8]) -> Vec<String> {
        let doc = parse_document(body);
        let hrefs = elements_named(&doc, "div")
            .filter(|div| children_named(*div, "h2").next().is_some())
            .filter_map(first_child_href);
        collect_links(hrefs)
    }
}
