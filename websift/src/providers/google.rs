//! Google result-page parser.

use super::{children_named, collect_links, elements_named, parse_document, ResultParser};

/// Parses Google result pages (`udm=14`, the plain web results view).
///
/// A result is a `div` with a direct `span` child that itself directly holds
/// the result anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleParser;

impl ResultParser for GoogleParser {
    fn parse(&self, body: &[u8]) -> Vec<String> {
        let doc = parse_document(body);
        let hrefs = elements_named(&doc, "div").filter_map(|div| {
            children_named(div, "span")
                .flat_map(|span| children_named(span, "a"))
                .find_map(|a| a.value().attr("href"))
        });
        collect_links(hrefs)
    }
}
