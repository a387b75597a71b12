//! Default document conversion.
//!
//! HTML goes through `htmd` to markdown, PDFs through `pdf-extract` to text.
//! Plain text is always derived from the markdown rendering.

use htmd::HtmlToMarkdown;
use pulldown_cmark::{Event, Options, Parser, Tag};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::errors::ConversionError;
use crate::protocols::{is_pdf_bytes, DocumentConverter};
use crate::text::collapse_newlines;

/// Tags whose content never reaches the markdown output.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "svg"];

/// Converts HTML and PDF documents to markdown and plain text.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    /// Creates a new converter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn html_to_markdown(html: &str) -> Result<String, ConversionError> {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(SKIPPED_TAGS.to_vec())
            .build();
        converter
            .convert(html)
            .map_err(|e| ConversionError::new(format!("HTML conversion failed: {e}")))
    }

    fn pdf_to_text(body: &[u8]) -> Result<String, ConversionError> {
        // pdf-extract panics on some malformed documents.
        match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(body))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ConversionError::new(format!("PDF extraction failed: {e}"))),
            Err(_) => Err(ConversionError::new("PDF extraction failed: malformed document")),
        }
    }
}

impl DocumentConverter for MarkdownConverter {
    fn to_markdown(&self, body: &[u8]) -> Result<String, ConversionError> {
        if is_pdf_bytes(body) {
            return Self::pdf_to_text(body);
        }
        let text = String::from_utf8_lossy(body);
        if text.contains('<') {
            Self::html_to_markdown(&text)
        } else {
            Ok(text.into_owned())
        }
    }

    fn to_plain_text(&self, body: &[u8]) -> Result<String, ConversionError> {
        let markdown = self.to_markdown(body)?;
        Ok(collapse_newlines(&markdown_to_text(&markdown)))
    }
}

/// Renders markdown as plain text, one line per block.
#[must_use]
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak | Event::Rule => out.push('\n'),
            Event::End(
                Tag::Paragraph
                | Tag::Heading(..)
                | Tag::Item
                | Tag::CodeBlock(_)
                | Tag::BlockQuote
                | Tag::TableHead
                | Tag::TableRow,
            ) => out.push('\n'),
            Event::End(Tag::TableCell) => out.push(' '),
            _ => {}
        }
    }
    out
}
