//! Google Scholar lookup source.
//!
//! NOTE: The scraping backend is DISABLED by default and requires the
//! GOOGLE_SCHOLAR_ENABLED environment variable to be set to "true" (or
//! `scholar.enabled = true` in the config file).
//!
//! Google Scholar does not have an official public API. The backend scrapes the
//! results page, which may violate Google's Terms of Service. Use at your own risk.
//!
//! The search itself sits behind [`ScholarBackend`] so that other providers
//! (or test doubles) can be plugged into [`ScholarSource`].

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::config::{Config, GOOGLE_SCHOLAR_ENABLED_VAR};
use crate::models::{CitationRecord, CiteKey, EntryType};
use crate::sources::{Lookup, MissReason, Source, SourceError};
use crate::utils::{jaccard_similarity, titles_match, HttpClient};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Venue words that mark a conference paper
const CONFERENCE_MARKERS: [&str; 3] = ["conference", "proceedings", "symposium"];

static YEAR_RE: OnceLock<Regex> = OnceLock::new();
static TAG_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

/// Author field that may hold a single name or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScholarAuthors {
    One(String),
    Many(Vec<String>),
}

impl ScholarAuthors {
    /// Normalize to a list of names
    pub fn into_list(self) -> Vec<String> {
        match self {
            ScholarAuthors::One(name) => vec![name],
            ScholarAuthors::Many(names) => names,
        }
    }
}

/// Bibliographic part of a Scholar result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarBib {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<ScholarAuthors>,
    #[serde(default)]
    pub pub_year: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub booktitle: Option<String>,
}

impl ScholarBib {
    /// Author names; `["Unknown"]` when the field is missing
    pub fn author_list(&self) -> Vec<String> {
        match &self.author {
            Some(authors) => authors.clone().into_list(),
            None => vec!["Unknown".to_string()],
        }
    }

    /// Venue text from the first present of `venue`, `journal`, `booktitle`
    pub fn venue_text(&self) -> &str {
        self.venue
            .as_deref()
            .or(self.journal.as_deref())
            .or(self.booktitle.as_deref())
            .unwrap_or_default()
    }
}

/// A single Scholar search result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarPublication {
    #[serde(default)]
    pub bib: ScholarBib,
    #[serde(default)]
    pub pub_url: Option<String>,
}

/// A provider of Scholar search results
#[async_trait]
pub trait ScholarBackend: Send + Sync + std::fmt::Debug {
    /// Search publications, most relevant first
    async fn search_pubs(&self, query: &str) -> Result<Vec<ScholarPublication>, SourceError>;
}

/// Backend that scrapes the Google Scholar results page
#[derive(Debug, Clone)]
pub struct GoogleScholarBackend {
    client: Arc<HttpClient>,
    base_url: String,
}

impl GoogleScholarBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::with_user_agent(BROWSER_USER_AGENT)?),
            base_url: base_url.into(),
        })
    }

    /// Parse a results page into publications, in page order
    pub fn parse_results(html: &str) -> Result<Vec<ScholarPublication>, SourceError> {
        let document = Html::parse_document(html);
        let result_sel = selector("div.gs_ri")?;
        let title_sel = selector("h3.gs_rt")?;
        let link_sel = selector("a")?;
        let byline_sel = selector("div.gs_a")?;

        let mut publications = Vec::new();

        for result in document.select(&result_sel) {
            let Some(heading) = result.select(&title_sel).next() else {
                continue;
            };

            let link = heading.select(&link_sel).next();
            let title = match link {
                Some(a) => element_text(&a),
                None => strip_tag_prefix(&element_text(&heading)),
            };
            let pub_url = link
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);

            let mut bib = ScholarBib {
                title,
                ..Default::default()
            };

            if let Some(byline) = result.select(&byline_sel).next() {
                parse_byline(&element_text(&byline), &mut bib);
            }

            publications.push(ScholarPublication { bib, pub_url });
        }

        Ok(publications)
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("Invalid selector {}: {:?}", css, e)))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove leading markers such as `[PDF]` or `[CITATION][C]`
fn strip_tag_prefix(title: &str) -> String {
    let re = TAG_PREFIX_RE.get_or_init(|| Regex::new(r"^(\[[^\]]*\]\s*)+").expect("static regex"));
    re.replace(title, "").trim().to_string()
}

fn trim_ellipsis(text: &str) -> &str {
    text.trim().trim_end_matches('…').trim()
}

/// Parse a byline of the form `authors - venue, year - host`
fn parse_byline(byline: &str, bib: &mut ScholarBib) {
    let mut parts = byline.split(" - ");

    let authors: Vec<String> = parts
        .next()
        .unwrap_or_default()
        .split(',')
        .map(trim_ellipsis)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    if !authors.is_empty() {
        bib.author = Some(ScholarAuthors::Many(authors));
    }

    let Some(venue_year) = parts.next() else {
        return;
    };

    let re = YEAR_RE.get_or_init(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").expect("static regex"));
    let venue = match re.find_iter(venue_year).last() {
        Some(year) => {
            bib.pub_year = Some(year.as_str().to_string());
            venue_year[..year.start()].trim().trim_end_matches(',')
        }
        None => venue_year,
    };

    let venue = trim_ellipsis(venue);
    if !venue.is_empty() {
        bib.venue = Some(venue.to_string());
    }
}

#[async_trait]
impl ScholarBackend for GoogleScholarBackend {
    async fn search_pubs(&self, query: &str) -> Result<Vec<ScholarPublication>, SourceError> {
        let url = format!("{}?hl=en&q={}", self.base_url, urlencoding::encode(query));
        tracing::debug!("Google Scholar query: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            SourceError::Network(format!("Failed to search Google Scholar: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "Google Scholar returned status: {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Self::parse_results(&html)
    }
}

/// Google Scholar lookup source
///
/// Holds an optional backend; without one every lookup is a
/// [`MissReason::Unavailable`] miss.
#[derive(Debug, Clone)]
pub struct ScholarSource {
    backend: Option<Arc<dyn ScholarBackend>>,
    threshold: f64,
}

impl ScholarSource {
    /// Create a source with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create a source from configuration, building the scraping backend only if enabled
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let backend: Option<Arc<dyn ScholarBackend>> = if config.scholar.enabled {
            Some(Arc::new(GoogleScholarBackend::new(&config.scholar.base_url)?))
        } else {
            tracing::info!(
                "Google Scholar source is disabled. Set {} to enable.",
                GOOGLE_SCHOLAR_ENABLED_VAR
            );
            None
        };

        Ok(Self {
            backend,
            threshold: config.similarity.threshold,
        })
    }

    /// Create a source around an injected backend
    pub fn with_backend(backend: Arc<dyn ScholarBackend>) -> Self {
        Self {
            backend: Some(backend),
            threshold: Config::default().similarity.threshold,
        }
    }

    /// Create a source with no backend
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            threshold: Config::default().similarity.threshold,
        }
    }

    /// Set the title similarity threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Whether a backend is configured
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Conference paper if the venue mentions a conference, proceedings or symposium
    pub fn classify(venue: &str) -> EntryType {
        let venue = venue.to_lowercase();
        if CONFERENCE_MARKERS.iter().any(|m| venue.contains(m)) {
            EntryType::InProceedings
        } else {
            EntryType::Article
        }
    }

    /// Build the BibTeX record for a publication
    pub fn to_record(&self, publication: &ScholarPublication) -> CitationRecord {
        let bib = &publication.bib;
        let authors = bib.author_list();
        let year = bib.pub_year.as_deref().map(str::trim).unwrap_or_default();
        let venue = bib.venue_text();
        let entry_type = Self::classify(venue);

        CitationRecord::new(entry_type, CiteKey::from_authors(self.id(), &authors, year))
            .authors(&authors)
            .field("title", bib.title.as_str())
            .field(entry_type.venue_field(), venue)
            .optional_field("year", Some(year))
            .optional_field("url", publication.pub_url.as_deref())
    }
}

impl Default for ScholarSource {
    fn default() -> Self {
        Self::unavailable()
    }
}

#[async_trait]
impl Source for ScholarSource {
    fn id(&self) -> &str {
        "scholar"
    }

    fn name(&self) -> &str {
        "Google Scholar"
    }

    async fn search_title(&self, title: &str) -> Result<Lookup, SourceError> {
        let Some(backend) = &self.backend else {
            tracing::info!(
                "Google Scholar backend unavailable, skipping. Set {}=true to enable.",
                GOOGLE_SCHOLAR_ENABLED_VAR
            );
            return Ok(Lookup::Miss(MissReason::Unavailable));
        };

        let Some(publication) = backend.search_pubs(title).await?.into_iter().next() else {
            return Ok(Lookup::Miss(MissReason::NoResults));
        };

        if !titles_match(title, &publication.bib.title, self.threshold) {
            return Ok(Lookup::Miss(MissReason::TitleMismatch {
                similarity: jaccard_similarity(title, &publication.bib.title).unwrap_or(0.0),
                candidate: publication.bib.title,
            }));
        }

        Ok(Lookup::Found(self.to_record(&publication)))
    }
}
