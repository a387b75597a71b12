//! Event side channel for search and extraction diagnostics.
//!
//! Coordinators never fail a batch because of one bad query or URL. What they
//! absorb is reported to an [`EventSink`] under the event types below.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A single query failed with every provider it tried.
pub const SEARCH_QUERY_FAILED: &str = "search.query.failed";
/// One provider of an `Auto` search failed.
pub const SEARCH_PROVIDER_FAILED: &str = "search.provider.failed";
/// A bulk search finished.
pub const SEARCH_BATCH_COMPLETED: &str = "search.batch.completed";
/// A URL could not be fetched or converted.
pub const EXTRACT_URL_FAILED: &str = "extract.url.failed";
/// A bulk extraction finished.
pub const EXTRACT_BATCH_COMPLETED: &str = "extract.batch.completed";
/// A pipeline run finished.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
