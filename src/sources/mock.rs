//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::{CitationRecord, CiteKey, EntryType};
use crate::sources::{Lookup, MissReason, Source, SourceError};

#[derive(Debug, Clone)]
enum MockResponse {
    Lookup(Lookup),
    Error(String),
}

/// A mock source for testing that returns predefined responses.
///
/// Without a configured response every search is a [`MissReason::NoResults`] miss.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    response: Mutex<Option<MockResponse>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a new mock source with the given id.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            response: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<MockResponse>> {
        self.response.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the lookup to return.
    pub fn set_lookup(&self, lookup: Lookup) {
        *self.guard() = Some(MockResponse::Lookup(lookup));
    }

    /// Make every search fail with a network error.
    pub fn set_error(&self, message: &str) {
        *self.guard() = Some(MockResponse::Error(message.to_string()));
    }

    /// Number of searches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search_title(&self, _title: &str) -> Result<Lookup, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.guard() {
            Some(MockResponse::Lookup(lookup)) => Ok(lookup.clone()),
            Some(MockResponse::Error(message)) => Err(SourceError::Network(message.clone())),
            None => Ok(Lookup::Miss(MissReason::NoResults)),
        }
    }
}

/// Helper function to create a minimal record for testing.
pub fn make_record(prefix: &str, author: &str, title: &str, year: &str) -> CitationRecord {
    let authors = vec![author.to_string()];
    CitationRecord::new(EntryType::Article, CiteKey::from_authors(prefix, &authors, year))
        .authors(&authors)
        .field("title", title)
        .field("year", year)
}
