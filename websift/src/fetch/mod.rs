//! Default HTTP transport.

pub mod headers;
mod http;

pub use http::HttpFetcher;
