//! Core data models for citation records.

mod citation;

pub use citation::{CitationRecord, CiteKey, EntryType};
