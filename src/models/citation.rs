//! Citation record model and BibTeX rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width that field names are padded to in rendered entries
const FIELD_NAME_WIDTH: usize = 9;

/// Separator between authors, aligning continuation lines under the first author
const AUTHOR_SEPARATOR: &str = " and\n               ";

/// BibTeX entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Journal article (also used for preprints)
    Article,
    /// Paper in conference proceedings
    InProceedings,
}

impl EntryType {
    /// Returns the BibTeX tag for this entry type
    pub fn tag(&self) -> &'static str {
        match self {
            EntryType::Article => "article",
            EntryType::InProceedings => "inproceedings",
        }
    }

    /// Returns the field name used for the venue of this entry type
    pub fn venue_field(&self) -> &'static str {
        match self {
            EntryType::Article => "journal",
            EntryType::InProceedings => "booktitle",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Citation key of the form `<prefix>:<Surname><Year>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiteKey {
    pub prefix: String,
    pub surname: String,
    pub year: String,
}

impl CiteKey {
    /// Build a key from the first author of `authors`.
    ///
    /// The surname is the last whitespace-separated token of the first author,
    /// or `Unknown` when there is no usable author.
    pub fn from_authors(prefix: &str, authors: &[String], year: &str) -> Self {
        let surname = authors
            .first()
            .and_then(|a| a.split_whitespace().last())
            .unwrap_or("Unknown")
            .to_string();

        Self {
            prefix: prefix.to_string(),
            surname,
            year: year.to_string(),
        }
    }
}

impl fmt::Display for CiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.prefix, self.surname, self.year)
    }
}

/// A single publication's bibliographic data, ready to be rendered as BibTeX.
///
/// Fields keep their insertion order. Records are built once per lookup and
/// rendered immediately; optional fields with no value are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub entry_type: EntryType,
    pub key: CiteKey,
    pub fields: Vec<(String, String)>,
}

impl CitationRecord {
    /// Create an empty record
    pub fn new(entry_type: EntryType, key: CiteKey) -> Self {
        Self {
            entry_type,
            key,
            fields: Vec::new(),
        }
    }

    /// Append the author list as a single `author` field
    pub fn authors(self, authors: &[String]) -> Self {
        let joined = authors.join(AUTHOR_SEPARATOR);
        self.field("author", joined)
    }

    /// Append a field
    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    /// Append a field only when a non-empty value is given
    pub fn optional_field(self, name: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the record as a BibTeX entry, terminated by a newline
    pub fn to_bibtex(&self) -> String {
        let body = self
            .fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "  {:<width$} = {{{}}}",
                    name,
                    value,
                    width = FIELD_NAME_WIDTH
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");

        if body.is_empty() {
            format!("@{}{{{},\n}}\n", self.entry_type, self.key)
        } else {
            format!("@{}{{{},\n{}\n}}\n", self.entry_type, self.key, body)
        }
    }
}

impl fmt::Display for CitationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bibtex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cite_key_uses_last_name_token() {
        let key = CiteKey::from_authors("arxiv", &authors(&["Ashish Vaswani"]), "2017");
        assert_eq!(key.to_string(), "arxiv:Vaswani2017");
    }

    #[test]
    fn test_cite_key_unknown_author() {
        let key = CiteKey::from_authors("scholar", &[], "2020");
        assert_eq!(key.to_string(), "scholar:Unknown2020");

        let key = CiteKey::from_authors("scholar", &authors(&["   "]), "");
        assert_eq!(key.to_string(), "scholar:Unknown");
    }

    #[test]
    fn test_to_bibtex_layout() {
        let record = CitationRecord::new(
            EntryType::Article,
            CiteKey::from_authors("arxiv", &authors(&["Ada Lovelace"]), "1843"),
        )
        .authors(&authors(&["Ada Lovelace", "Charles Babbage"]))
        .field("title", "{Notes}")
        .field("year", "1843");

        let expected = "@article{arxiv:Lovelace1843,\n\
                        \x20 author    = {Ada Lovelace and\n\
                        \x20              Charles Babbage},\n\
                        \x20 title     = {{Notes}},\n\
                        \x20 year      = {1843}\n\
                        }\n";
        assert_eq!(record.to_bibtex(), expected);
    }

    #[test]
    fn test_booktitle_is_not_padded_past_width() {
        let record = CitationRecord::new(
            EntryType::InProceedings,
            CiteKey::from_authors("scholar", &authors(&["A B"]), "2001"),
        )
        .field("booktitle", "Proc. X");

        assert!(record.to_bibtex().contains("  booktitle = {Proc. X}"));
        assert!(record.to_bibtex().starts_with("@inproceedings{scholar:B2001,"));
    }

    #[test]
    fn test_optional_field_skips_empty() {
        let record = CitationRecord::new(
            EntryType::Article,
            CiteKey::from_authors("x", &[], ""),
        )
        .optional_field("url", None)
        .optional_field("doi", Some("  "))
        .optional_field("note", Some("kept"));

        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.get("note"), Some("kept"));
        assert_eq!(record.get("url"), None);
    }

    #[test]
    fn test_venue_field_per_entry_type() {
        assert_eq!(EntryType::Article.venue_field(), "journal");
        assert_eq!(EntryType::InProceedings.venue_field(), "booktitle");
    }
}
