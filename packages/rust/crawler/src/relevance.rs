//! Text relevance scoring between a page's meta description and its content.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Words of two or more characters; single letters and digits carry no topic.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("word regex"));

/// Similarity between two texts, in `[0, 1]`.
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// TF-IDF weighted cosine similarity over lower-cased word tokens.
///
/// The two input texts form the whole corpus, so terms shared by both get a
/// lower weight than terms unique to one side. Smoothed IDF keeps shared terms
/// from vanishing entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl RelevanceScorer for LexicalScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        let tf_a = term_frequencies(a);
        let tf_b = term_frequencies(b);
        if tf_a.is_empty() || tf_b.is_empty() {
            return 0.0;
        }

        let vocabulary: HashSet<&str> = tf_a.keys().chain(tf_b.keys()).map(String::as_str).collect();

        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for term in vocabulary {
            let fa = tf_a.get(term).copied().unwrap_or(0.0);
            let fb = tf_b.get(term).copied().unwrap_or(0.0);
            let df = u8::from(fa > 0.0) + u8::from(fb > 0.0);
            // smoothed idf over a corpus of two documents
            let idf = (3.0 / (1.0 + f64::from(df))).ln() + 1.0;

            let wa = fa * idf;
            let wb = fb * idf;
            dot += wa * wb;
            norm_a += wa * wa;
            norm_b += wb * wb;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
    }
}

/// Relative term frequencies of `text`.
fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts: HashMap<String, f64> = HashMap::new();
    let mut total = 0.0;
    for word in WORD_RE.find_iter(text) {
        *counts.entry(word.as_str().to_lowercase()).or_insert(0.0) += 1.0;
        total += 1.0;
    }
    for value in counts.values_mut() {
        *value /= total;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_score_one() {
        let s = LexicalScorer.score("Fresh coffee beans", "fresh Coffee BEANS");
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        assert_eq!(LexicalScorer.score("coffee beans", "garden tools"), 0.0);
    }

    #[test]
    fn partial_overlap_is_between() {
        let s = LexicalScorer.score(
            "Roasted coffee beans delivered daily",
            "We sell coffee and tea. Our coffee beans are roasted locally.",
        );
        assert!(s > 0.0 && s < 1.0, "got {s}");
    }

    #[test]
    fn closer_text_scores_higher() {
        let meta = "handmade oak furniture";
        let close = LexicalScorer.score(meta, "handmade oak tables and oak chairs");
        let far = LexicalScorer.score(meta, "steel shelving for warehouses and oak");
        assert!(close > far);
    }

    #[test]
    fn single_character_tokens_are_ignored() {
        assert_eq!(LexicalScorer.score("a b c 1", "a b c 1"), 0.0);
        let s = LexicalScorer.score("oak chairs", "a oak chairs b");
        assert!((s - 1.0).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(LexicalScorer.score("", "anything"), 0.0);
        assert_eq!(LexicalScorer.score("anything", "   "), 0.0);
    }
}
