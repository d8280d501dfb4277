//! Title similarity used to reject mismatched search results.
//!
//! Titles are reduced to sets of lower-cased word tokens and compared with the
//! Jaccard index. The check guards against a search service returning an
//! unrelated top hit; it is not used for ranking.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Default minimum Jaccard index for two titles to be considered the same work
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

static WORD_RE: OnceLock<Regex> = OnceLock::new();

fn word_regex() -> &'static Regex {
    WORD_RE.get_or_init(|| Regex::new(r"\w+").expect("static regex"))
}

/// Normalize a title into its set of lower-cased word tokens
pub fn title_tokens(title: &str) -> HashSet<String> {
    let lowered = title.to_lowercase();
    word_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Jaccard index of the word sets of two titles.
///
/// Returns `None` when either title has no word tokens.
pub fn jaccard_similarity(a: &str, b: &str) -> Option<f64> {
    let words_a = title_tokens(a);
    let words_b = title_tokens(b);

    if words_a.is_empty() || words_b.is_empty() {
        return None;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();

    Some(intersection as f64 / union as f64)
}

/// Whether two titles are similar enough to describe the same paper
pub fn titles_match(a: &str, b: &str, threshold: f64) -> bool {
    jaccard_similarity(a, b).is_some_and(|score| score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_punctuation_ignored() {
        assert!(titles_match(
            "Attention Is All You Need",
            "attention is all you need!",
            DEFAULT_SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn test_identical_token_sets_score_one() {
        let score = jaccard_similarity("Deep Residual Learning", "learning, residual: DEEP");
        assert_eq!(score, Some(1.0));
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("Attention Is All You Need", "Attention Is Not All You Need"),
            ("BERT", "BERT: Pre-training of Deep Bidirectional Transformers"),
            ("a b c", "c d e f"),
            ("", "something"),
        ];
        for (a, b) in pairs {
            assert_eq!(jaccard_similarity(a, b), jaccard_similarity(b, a));
            assert_eq!(
                titles_match(a, b, DEFAULT_SIMILARITY_THRESHOLD),
                titles_match(b, a, DEFAULT_SIMILARITY_THRESHOLD)
            );
        }
    }

    #[test]
    fn test_empty_token_sets_never_match() {
        assert_eq!(jaccard_similarity("?!.,", "Some Title"), None);
        assert!(!titles_match("?!.,", "?!.,", 0.0));
        assert!(!titles_match("", "", 0.0));
    }

    #[test]
    fn test_below_threshold() {
        // 3 shared of 6 distinct words
        let score = jaccard_similarity("graph neural networks", "graph neural networks survey review book");
        assert_eq!(score, Some(0.5));
        assert!(!titles_match(
            "graph neural networks",
            "graph neural networks survey review book",
            DEFAULT_SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 7 shared of 10 distinct words
        let a = "w1 w2 w3 w4 w5 w6 w7 a1 a2 a3";
        let b = "w1 w2 w3 w4 w5 w6 w7";
        assert_eq!(jaccard_similarity(a, b), Some(0.7));
        assert!(titles_match(a, b, 0.7));
    }
}
