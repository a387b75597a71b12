//! Testing utilities for websift.
//!
//! This module provides stub collaborators that stand in for the network and
//! for document conversion:
//! - [`StubFetcher`] answers from in-memory routes with optional delays
//! - [`StubConverter`] passes bodies through as text

mod stubs;

pub use stubs::{StubConverter, StubFetcher};
