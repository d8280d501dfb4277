//! Utility modules supporting lookups.
//!
//! - [`HttpClient`]: shared HTTP client with a fixed request timeout
//! - [`titles_match`]: word-set Jaccard comparison of two titles
//!
//! # Title Similarity
//!
//! ```rust
//! use citation_fallback::utils::{titles_match, DEFAULT_SIMILARITY_THRESHOLD};
//!
//! assert!(titles_match(
//!     "Attention Is All You Need",
//!     "Attention is All you Need",
//!     DEFAULT_SIMILARITY_THRESHOLD,
//! ));
//! ```

mod http;
mod similarity;

pub use http::{HttpClient, DEFAULT_TIMEOUT_SECS};
pub use similarity::{
    jaccard_similarity, title_tokens, titles_match, DEFAULT_SIMILARITY_THRESHOLD,
};
