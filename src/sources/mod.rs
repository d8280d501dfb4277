//! Lookup sources with a shared trait-based interface.
//!
//! Each source takes a paper title, runs a single search against one external
//! service and checks the top hit's title against the query. A matching hit is
//! returned as a [`CitationRecord`]; anything else is a [`Lookup::Miss`] with the
//! reason recorded. Transport and parse failures are returned as
//! [`SourceError`] so callers can tell "nothing matched" from "the service broke".
//!
//! The [`FallbackSearch`] orchestrator chains the sources: arXiv first, then
//! Google Scholar after a short courtesy delay.
//!
//! # Runtime Source Configuration
//!
//! Google Scholar has no official API and is scraped, so its backend is only
//! built when explicitly enabled:
//!
//! - `GOOGLE_SCHOLAR_ENABLED=true`, or
//! - `enabled = true` in the `[scholar]` section of the config file
//!
//! Without a backend the Scholar source reports [`MissReason::Unavailable`].

mod arxiv;
mod fallback;
mod google_scholar;

pub mod mock;

pub use arxiv::{ArxivEntry, ArxivSource};
pub use fallback::{FallbackOptions, FallbackSearch};
pub use google_scholar::{
    GoogleScholarBackend, ScholarAuthors, ScholarBackend, ScholarBib, ScholarPublication,
    ScholarSource,
};
pub use mock::MockSource;

use crate::models::CitationRecord;
use async_trait::async_trait;
use std::fmt;

/// The Source trait defines the interface shared by all lookup services.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Return `Lookup::Found` only when the hit's title matches the query
/// 3. Return `Lookup::Miss` for "no usable result" and `Err` for failures
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source, also used as the cite key prefix
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search for a single publication by title
    async fn search_title(&self, title: &str) -> Result<Lookup, SourceError>;
}

/// Outcome of a title lookup that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The top hit matched the query title
    Found(CitationRecord),
    /// No usable hit
    Miss(MissReason),
}

impl Lookup {
    /// Consume the lookup, keeping only a found record
    pub fn into_record(self) -> Option<CitationRecord> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::Miss(_) => None,
        }
    }

    /// Whether a record was found
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Why a lookup produced no record
#[derive(Debug, Clone, PartialEq)]
pub enum MissReason {
    /// The service returned no results
    NoResults,
    /// The top result's title is too different from the query
    TitleMismatch { candidate: String, similarity: f64 },
    /// The service's backend is not available in this build or configuration
    Unavailable,
    /// The source was turned off for this lookup
    Disabled,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::NoResults => write!(f, "no results"),
            MissReason::TitleMismatch {
                candidate,
                similarity,
            } => write!(
                f,
                "top result \"{}\" does not match (similarity {:.2})",
                candidate, similarity
            ),
            MissReason::Unavailable => write!(f, "backend unavailable"),
            MissReason::Disabled => write!(f, "disabled"),
        }
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON, HTML, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
