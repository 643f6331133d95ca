//! Tokenisation and set-similarity helpers shared by the clustering engine
//! and the keyword extraction it depends on.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9']+").unwrap());

/// Fixed stopword list used to filter tokens before Jaccard comparison.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "at", "for",
    "with", "from", "by", "as", "is", "are", "was", "were", "be", "been",
    "being", "that", "this", "these", "those", "it", "its", "into", "over",
    "after", "before", "about", "has", "have", "had", "will", "would",
    "could", "should", "not", "no", "than", "then", "which", "who", "whom",
    "what", "when", "where", "how", "says", "said", "new",
];

/// Lowercase word tokens, stopword-filtered, length > 3 ("significant"
/// tokens per the glossary definition of Jaccard).
pub fn significant_tokens(text: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// `|A ∩ B| / |A ∪ B|` over two token sets; 0.0 when both are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Cosine similarity between two equal-length embedding vectors. Returns 0.0
/// if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Top-N most frequent significant tokens across a set of texts, used as a
/// cheap keyword extractor when opening a new cluster or merging keywords.
pub fn extract_keywords(texts: &[&str], top_n: usize) -> Vec<String> {
    use std::collections::HashMap;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for token in significant_tokens(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    let mut pairs: Vec<(String, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs.into_iter().take(top_n).map(|(k, _)| k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significant_tokens_drops_short_and_stopwords() {
        let toks = significant_tokens("The ECB raises rates to 4.5% on Tuesday");
        assert!(toks.contains("raises"));
        assert!(toks.contains("rates"));
        assert!(toks.contains("tuesday"));
        assert!(!toks.contains("the"));
        assert!(!toks.contains("ecb")); // length 3, filtered by length>3 rule
    }

    #[test]
    fn jaccard_identical_sets_is_one() {
        let a = significant_tokens("central bank raises interest rates sharply");
        let b = significant_tokens("central bank raises interest rates sharply");
        assert_eq!(jaccard(&a, &b), 1.0);
    }

    #[test]
    fn jaccard_disjoint_sets_is_zero() {
        let a = significant_tokens("central bank raises interest rates");
        let b = significant_tokens("football league final victory parade");
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![0.1, 0.2, 0.3, 0.4];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn extract_keywords_ranks_by_frequency() {
        let texts = vec!["rates rates bank", "rates bank market"];
        let kws = extract_keywords(&texts, 2);
        assert_eq!(kws[0], "rates");
    }
}
