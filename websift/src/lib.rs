//! # Websift
//!
//! Multi-provider web search with concurrent content extraction.
//!
//! Websift queries public search engines (Google, Bing, Yahoo, DuckDuckGo),
//! normalizes the result links and fetches the pages behind them:
//!
//! - **Providers**: one result-page parser per engine, plus an `auto` mode
//!   that races two randomly chosen engines
//! - **Bulk search**: many queries on a bounded worker pool, results kept in
//!   query order
//! - **Extraction**: pages fetched concurrently, converted to markdown or
//!   plain text and ranked by content length
//! - **Pluggable transport**: [`protocols::Fetcher`] and
//!   [`protocols::DocumentConverter`] traits with reqwest and htmd defaults
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use websift::prelude::*;
//!
//! let pipeline = SearchPipeline::from_config(&PipelineConfig::default())?;
//! let records = pipeline
//!     .run(&["rust async runtime".to_string()], 3)
//!     .await;
//!
//! for record in records {
//!     println!("{} ({} chars)", record.url, record.char_len());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod bulk;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod extractor;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod protocols;
pub mod providers;
pub mod testing;
pub mod text;

#[cfg(feature = "convert")]
pub mod convert;
#[cfg(feature = "http")]
pub mod fetch;

#[cfg(all(feature = "http", feature = "convert"))]
pub use pipeline::run_pipeline;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ExtractionConfig, FetchConfig, PipelineConfig, RetryConfig, SearchConfig,
    };
    pub use crate::engine::SearchEngine;
    pub use crate::errors::{
        ConversionError, FailureKind, FetchError, ItemFailure, WebsiftError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::extractor::{rank_by_length, ContentExtractor};
    pub use crate::logging::{init_tracing, LogFormat};
    pub use crate::models::{
        BulkSearchOutput, ContentType, ExtractionRecord, Provider, SearchRecord,
    };
    pub use crate::normalize::normalize_url;
    pub use crate::pipeline::SearchPipeline;
    pub use crate::pool::WorkerPool;
    pub use crate::protocols::{DocumentConverter, FetchResult, FetchedDocument, Fetcher};
    pub use crate::providers::ResultParser;

    #[cfg(feature = "convert")]
    pub use crate::convert::MarkdownConverter;
    #[cfg(feature = "http")]
    pub use crate::fetch::HttpFetcher;
    #[cfg(all(feature = "http", feature = "convert"))]
    pub use crate::pipeline::run_pipeline;
}
