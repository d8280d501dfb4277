//! # Citation Fallback
//!
//! Fallback BibTeX lookup for paper titles that a primary bibliography database
//! could not resolve. Titles are searched on arXiv first and then on Google
//! Scholar; the first result whose title matches the query is rendered as a
//! BibTeX entry.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Citation record and BibTeX rendering
//! - [`sources`]: arXiv and Google Scholar lookups plus the fallback orchestrator
//! - [`utils`]: HTTP client and title similarity
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::CitationRecord;
pub use sources::{FallbackOptions, FallbackSearch, Lookup, Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
