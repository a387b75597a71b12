//! Bing result-page parser.

use super::{collect_links, elements_named, first_child_href, parse_document, ResultParser};

/// Parses Bing result pages, where each result title is an `h2 > a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BingParser;

impl ResultParser for BingParser {
    fn parse(&self, body: &[u8]) -> Vec<String> {
        let doc = parse_document(body);
        collect_links(elements_named(&doc, "h2").filter_map(first_child_href))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_heading_anchors() {
        let html = br#"<ol id="b_results">
            <li class="b_algo"><h2><a href="https://a.test/">A</a></h2></li>
            <li class="b_algo"><h2><a href="https://b.test/page?x=1">B</a></h2></li>
            <li class="b_ad"><h2>Sponsored</h2></li>
        </ol>"#;

        assert_eq!(
            BingParser.parse(html),
            vec!["https://a.test/", "https://b.test/page?x=1"]
        );
    }

    #[test]
    fn test_first_seen_wins() {
        let html = br#"
            <h2><a href="https://a.test">1</a></h2>
            <h2><a href="https://b.test">2</a></h2>
            <h2><a href="https://a.test">3</a></h2>
            <h2><a href="https://c.test">4</a></h2>
            <h2><a href="https://b.test">5</a></h2>"#;

        assert_eq!(
            BingParser.parse(html),
            vec!["https://a.test", "https://b.test", "https://c.test"]
        );
    }

    #[test]
    fn test_skips_anchor_without_href() {
        let html = br#"<h2><a name="x">x</a><a href="https://a.test">a</a></h2>"#;
        assert_eq!(BingParser.parse(html), vec!["https://a.test"]);
    }
}
