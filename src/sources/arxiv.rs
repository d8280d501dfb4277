//! arXiv lookup source.
//!
//! Queries the arXiv Atom API for a title and turns the top entry into an
//! `@article` record keyed `arxiv:<Surname><Year>`.

use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};

use crate::config::Config;
use crate::models::{CitationRecord, CiteKey, EntryType};
use crate::sources::{Lookup, MissReason, Source, SourceError};
use crate::utils::{jaccard_similarity, titles_match, HttpClient};

/// Base URL for arXiv API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

static VERSION_RE: OnceLock<Regex> = OnceLock::new();
static PUNCT_RE: OnceLock<Regex> = OnceLock::new();

/// Atom feed as returned by the arXiv query API
#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
    #[serde(rename = "arxiv:journal_ref", alias = "journal_ref")]
    journal_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

/// A parsed arXiv search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivEntry {
    /// arXiv identifier without version suffix, e.g. `1706.03762`
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// Four-digit publication year, empty if unknown
    pub year: String,
    pub abstract_text: String,
    /// DOI of the published version, if the work has since been published
    pub doi: Option<String>,
    /// Journal reference of the published version
    pub journal_ref: Option<String>,
}

/// arXiv lookup source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    base_url: String,
    max_results: usize,
    threshold: f64,
}

impl ArxivSource {
    /// Create a new arXiv source with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create a source from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::with_timeout(config.arxiv.timeout())?;
        Ok(Self {
            client: Arc::new(client),
            base_url: config.arxiv.base_url.clone(),
            max_results: config.arxiv.max_results.max(1),
            threshold: config.similarity.threshold,
        })
    }

    /// Create with a custom HTTP client and endpoint (for testing)
    pub fn with_client(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            client,
            base_url: base_url.into(),
            max_results: defaults.arxiv.max_results,
            threshold: defaults.similarity.threshold,
        }
    }

    /// Set the number of results requested from the API
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Set the title similarity threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace punctuation with spaces and collapse whitespace
    pub fn clean_title(title: &str) -> String {
        let re = PUNCT_RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"));
        re.replace_all(title, " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Strip a trailing version suffix (`v1`, `v12`, ...) from an identifier
    pub fn strip_version(id: &str) -> String {
        let re = VERSION_RE.get_or_init(|| Regex::new(r"v\d+$").expect("static regex"));
        re.replace(id, "").into_owned()
    }

    /// Build the query URL for a title search
    fn build_url(&self, title: &str) -> String {
        let search_query = format!("ti:\"{}\"", Self::clean_title(title));
        format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=relevance",
            self.base_url,
            urlencoding::encode(&search_query),
            self.max_results
        )
    }

    /// Parse an arXiv Atom response into entries
    pub fn parse_feed(xml: &str) -> Result<Vec<ArxivEntry>, SourceError> {
        let feed: AtomFeed = quick_xml::de::from_str(xml)?;
        Ok(feed.entries.into_iter().map(Self::parse_entry).collect())
    }

    fn parse_entry(entry: AtomEntry) -> ArxivEntry {
        let raw_id = entry.id.trim().rsplit('/').next().unwrap_or_default();

        let year = entry
            .published
            .as_deref()
            .map(str::trim)
            .map(|p| match DateTime::parse_from_rfc3339(p) {
                Ok(dt) => dt.year().to_string(),
                Err(_) => p.chars().take(4).collect(),
            })
            .unwrap_or_default();

        ArxivEntry {
            arxiv_id: Self::strip_version(raw_id),
            title: collapse_whitespace(entry.title.as_deref().unwrap_or_default()),
            authors: entry
                .authors
                .iter()
                .map(|a| collapse_whitespace(&a.name))
                .filter(|a| !a.is_empty())
                .collect(),
            year,
            abstract_text: collapse_whitespace(entry.summary.as_deref().unwrap_or_default()),
            doi: clean_optional(entry.doi),
            journal_ref: clean_optional(entry.journal_ref),
        }
    }

    /// Run the title query and return the parsed entries in relevance order
    pub async fn fetch_entries(&self, title: &str) -> Result<Vec<ArxivEntry>, SourceError> {
        let url = self.build_url(title);
        tracing::debug!("arXiv query: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv results: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv API returned status: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Self::parse_feed(&body)
    }

    /// Build the BibTeX record for an entry
    pub fn to_record(&self, entry: &ArxivEntry) -> CitationRecord {
        CitationRecord::new(
            EntryType::Article,
            CiteKey::from_authors(self.id(), &entry.authors, &entry.year),
        )
        .authors(&entry.authors)
        .field("title", format!("{{{}}}", entry.title))
        .field("journal", format!("arXiv preprint arXiv:{}", entry.arxiv_id))
        .field("year", entry.year.as_str())
        .optional_field("doi", entry.doi.as_deref())
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}

impl Default for ArxivSource {
    fn default() -> Self {
        Self::new().expect("Failed to create ArxivSource")
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search_title(&self, title: &str) -> Result<Lookup, SourceError> {
        let entries = self.fetch_entries(title).await?;

        let Some(entry) = entries.into_iter().next() else {
            return Ok(Lookup::Miss(MissReason::NoResults));
        };

        if !titles_match(title, &entry.title, self.threshold) {
            return Ok(Lookup::Miss(MissReason::TitleMismatch {
                similarity: jaccard_similarity(title, &entry.title).unwrap_or(0.0),
                candidate: entry.title,
            }));
        }

        if let Some(journal_ref) = &entry.journal_ref {
            tracing::debug!("arXiv {} has been published: {}", entry.arxiv_id, journal_ref);
        }

        Ok(Lookup::Found(self.to_record(&entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const ATTENTION_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=ti:"Attention Is All You Need"</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-01-01T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v5</id>
    <updated>2017-12-06T03:30:32Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention is All
      you Need</title>
    <summary>  The dominant sequence transduction models are based on
      complex recurrent or convolutional neural networks.</summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
    <arxiv:comment>15 pages, 5 figures</arxiv:comment>
    <link href="http://arxiv.org/abs/1706.03762v5" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: nothing</title>
  <id>http://arxiv.org/api/empty</id>
</feed>"#;

    fn source_for(server: &Server) -> ArxivSource {
        let client = Arc::new(HttpClient::new().unwrap());
        ArxivSource::with_client(client, format!("{}/api/query", server.url()))
    }

    #[test]
    fn test_strip_version() {
        assert_eq!(ArxivSource::strip_version("1706.03762v5"), "1706.03762");
        assert_eq!(ArxivSource::strip_version("2301.12345v12"), "2301.12345");
        assert_eq!(ArxivSource::strip_version("2301.12345"), "2301.12345");
        // Only a trailing suffix is stripped
        assert_eq!(ArxivSource::strip_version("solv-int/9901001"), "solv-int/9901001");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(
            ArxivSource::clean_title("BERT: Pre-training of  Deep\tTransformers!"),
            "BERT Pre training of Deep Transformers"
        );
    }

    #[test]
    fn test_parse_feed() {
        let entries = ArxivSource::parse_feed(ATTENTION_FEED).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.arxiv_id, "1706.03762");
        assert_eq!(entry.title, "Attention is All you Need");
        assert_eq!(entry.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(entry.year, "2017");
        assert!(entry.abstract_text.starts_with("The dominant sequence"));
        assert_eq!(entry.doi, None);
        assert_eq!(entry.journal_ref, None);
    }

    #[test]
    fn test_parse_feed_extension_elements() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/1512.03385v1</id>
    <published>2015-12-10T19:51:55Z</published>
    <title>Deep Residual Learning for Image Recognition</title>
    <summary>Deeper networks are harder to train.</summary>
    <author><name>Kaiming He</name></author>
    <arxiv:doi>10.1109/CVPR.2016.90</arxiv:doi>
    <arxiv:journal_ref>CVPR 2016</arxiv:journal_ref>
  </entry>
</feed>"#;

        let entries = ArxivSource::parse_feed(xml).unwrap();
        assert_eq!(entries[0].doi.as_deref(), Some("10.1109/CVPR.2016.90"));
        assert_eq!(entries[0].journal_ref.as_deref(), Some("CVPR 2016"));
    }

    #[test]
    fn test_parse_feed_empty() {
        assert!(ArxivSource::parse_feed(EMPTY_FEED).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_invalid_xml() {
        assert!(matches!(
            ArxivSource::parse_feed("<feed><entry>"),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_search_title_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "search_query".into(),
                    "ti:\"Attention Is All You Need\"".into(),
                ),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("max_results".into(), "1".into()),
                Matcher::UrlEncoded("sortBy".into(), "relevance".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(ATTENTION_FEED)
            .create_async()
            .await;

        let source = source_for(&server);
        let lookup = source.search_title("Attention Is All You Need").await.unwrap();
        mock.assert_async().await;

        let record = lookup.into_record().expect("record should be found");
        assert_eq!(record.key.to_string(), "arxiv:Vaswani2017");
        assert_eq!(record.get("journal"), Some("arXiv preprint arXiv:1706.03762"));
        assert_eq!(record.get("title"), Some("{Attention is All you Need}"));
        assert_eq!(record.get("doi"), None);

        let bibtex = record.to_bibtex();
        assert!(bibtex.starts_with("@article{arxiv:Vaswani2017,\n"));
        assert!(bibtex.contains("  author    = {Ashish Vaswani and\n               Noam Shazeer},\n"));
        assert!(bibtex.ends_with("  year      = {2017}\n}\n"));
    }

    #[tokio::test]
    async fn test_search_title_no_entries() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(EMPTY_FEED)
            .create_async()
            .await;

        let lookup = source_for(&server).search_title("Anything").await.unwrap();
        assert_eq!(lookup, Lookup::Miss(MissReason::NoResults));
    }

    #[tokio::test]
    async fn test_search_title_mismatch() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ATTENTION_FEED)
            .create_async()
            .await;

        let lookup = source_for(&server)
            .search_title("Attention Mechanisms in Graph Neural Networks")
            .await
            .unwrap();

        match lookup {
            Lookup::Miss(MissReason::TitleMismatch { candidate, similarity }) => {
                assert_eq!(candidate, "Attention is All you Need");
                assert!(similarity < 0.7);
            }
            other => panic!("expected title mismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_title_without_words_never_matches() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ATTENTION_FEED)
            .create_async()
            .await;

        let lookup = source_for(&server)
            .threshold(0.0)
            .search_title("?!.,")
            .await
            .unwrap();

        assert!(!lookup.is_found());
        assert_eq!(
            lookup,
            Lookup::Miss(MissReason::TitleMismatch {
                candidate: "Attention is All you Need".to_string(),
                similarity: 0.0,
            })
        );
    }

    #[tokio::test]
    async fn test_search_title_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = source_for(&server).search_title("Attention Is All You Need").await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[tokio::test]
    async fn test_search_title_emits_doi() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/1512.03385v1</id>
    <published>2015-12-10T19:51:55Z</published>
    <title>Deep Residual Learning for Image Recognition</title>
    <summary>Deeper networks are harder to train.</summary>
    <author><name>Kaiming He</name></author>
    <arxiv:doi>10.1109/CVPR.2016.90</arxiv:doi>
  </entry>
</feed>"#;

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(xml)
            .create_async()
            .await;

        let record = source_for(&server)
            .search_title("Deep Residual Learning for Image Recognition.")
            .await
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(record.key.to_string(), "arxiv:He2015");
        assert_eq!(record.get("doi"), Some("10.1109/CVPR.2016.90"));
        assert!(record.to_bibtex().ends_with("  doi       = {10.1109/CVPR.2016.90}\n}\n"));
    }
}
