//! Fallback orchestrator: arXiv first, then Google Scholar.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::CitationRecord;
use crate::sources::{ArxivSource, Lookup, MissReason, ScholarSource, Source, SourceError};

/// Which services a fallback search may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackOptions {
    pub use_arxiv: bool,
    pub use_scholar: bool,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            use_arxiv: true,
            use_scholar: true,
        }
    }
}

impl FallbackOptions {
    /// Options with both services enabled, except arXiv when disabled in config
    pub fn from_config(config: &Config) -> Self {
        Self {
            use_arxiv: config.arxiv.enabled,
            use_scholar: true,
        }
    }

    pub fn arxiv(mut self, enabled: bool) -> Self {
        self.use_arxiv = enabled;
        self
    }

    pub fn scholar(mut self, enabled: bool) -> Self {
        self.use_scholar = enabled;
        self
    }
}

/// Sequential fallback across the arXiv and Scholar sources.
///
/// Every failure mode of a source (no results, title mismatch, missing backend,
/// HTTP or parse errors) degrades to "not found" here; errors are logged and
/// never returned.
#[derive(Debug, Clone)]
pub struct FallbackSearch {
    arxiv: Arc<dyn Source>,
    scholar: Arc<dyn Source>,
    delay: Duration,
}

impl FallbackSearch {
    /// Create an orchestrator over two sources with the default courtesy delay
    pub fn new(arxiv: Arc<dyn Source>, scholar: Arc<dyn Source>) -> Self {
        Self {
            arxiv,
            scholar,
            delay: Config::default().scholar.delay(),
        }
    }

    /// Create an orchestrator with sources built from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self {
            arxiv: Arc::new(ArxivSource::from_config(config)?),
            scholar: Arc::new(ScholarSource::from_config(config)?),
            delay: config.scholar.delay(),
        })
    }

    /// Set the pause taken before querying Scholar
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Find a citation record for `title`, or `None` if no enabled service matched
    pub async fn lookup(&self, title: &str, options: FallbackOptions) -> Option<CitationRecord> {
        if options.use_arxiv {
            if let Some(record) = attempt(self.arxiv.as_ref(), title).await {
                return Some(record);
            }
        } else {
            skip(self.arxiv.as_ref());
        }

        if !options.use_scholar {
            skip(self.scholar.as_ref());
            return None;
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        attempt(self.scholar.as_ref(), title).await
    }

    /// Find a citation for `title` and render it as BibTeX
    pub async fn search(&self, title: &str, options: FallbackOptions) -> Option<String> {
        self.lookup(title, options)
            .await
            .map(|record| record.to_bibtex())
    }
}

async fn attempt(source: &dyn Source, title: &str) -> Option<CitationRecord> {
    tracing::info!("[{}] searching...", source.name());

    match source.search_title(title).await {
        Ok(Lookup::Found(record)) => {
            tracing::info!("[{}] found a match: {}", source.name(), record.key);
            Some(record)
        }
        Ok(Lookup::Miss(reason)) => {
            tracing::info!("[{}] no match: {}", source.name(), reason);
            None
        }
        Err(e) => {
            tracing::warn!("[{}] search failed: {}", source.name(), e);
            None
        }
    }
}

fn skip(source: &dyn Source) {
    tracing::info!("[{}] skipped: {}", source.name(), MissReason::Disabled);
}
