//! Standalone analyzers built on the same vector primitives as AS/EAS:
//! direct similarity to a target token, windowed n-gram perturbation around
//! a target token, and the full pairwise influence matrix.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_IMPACT, NGRAM_SIZE_LIMIT};
use crate::embedding::{EmbeddingTable, average_of_words};
use crate::enhanced::pair_influence;
use crate::error::Result;
use crate::token::{Resolution, ResolvedToken, Token};
use crate::tokenizer::tokenize;
use crate::vector::cosine_similarity;

/// Similarity outcome for one token against the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "embedding", rename_all = "snake_case")]
pub enum SimilarityMatch {
    Scored { similarity: f64 },
    NoEmbedding,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSimilarity {
    pub token: String,
    pub original_index: usize,
    #[serde(flatten)]
    pub matched: SimilarityMatch,
}

impl TokenSimilarity {
    /// Similarity to the target; tokens without an embedding rank as 0.
    pub fn similarity(&self) -> f64 {
        match self.matched {
            SimilarityMatch::Scored { similarity } => similarity,
            SimilarityMatch::NoEmbedding => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramImpact {
    pub n_gram: String,
    pub n: usize,
    pub target_token_index: usize,
    pub impact: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramImportance {
    pub total_importance: f64,
    pub n_gram_impacts: Vec<NgramImpact>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairInfluence {
    pub influencer: String,
    pub influenced: String,
    pub influence: f64,
}

/// Cosine similarity between `target` and every other token of `text`,
/// sorted most similar first.
///
/// Empty if `target` has no embedding. An occurrence of the target (compared
/// case-folded) is skipped unless `target`, spelled exactly as given, appears
/// again later in the sentence; such earlier repeats are listed like any
/// other token.
pub fn target_token_importance(
    text: &str,
    target: &str,
    table: &EmbeddingTable,
) -> Vec<TokenSimilarity> {
    let words = tokenize(text);
    let Some(target_vector) = table.resolve(target) else {
        return Vec::new();
    };

    let target_lower = target.to_lowercase();
    let is_self = |i: usize| {
        words[i].to_lowercase() == target_lower && !words[i + 1..].iter().any(|w| w == target)
    };

    let mut results: Vec<TokenSimilarity> = Token::sequence(&words)
        .into_iter()
        .filter(|token| !is_self(token.original_index))
        .map(|token| {
            let matched = match token.resolve(table) {
                Resolution::Resolved { vector } => SimilarityMatch::Scored {
                    similarity: cosine_similarity(&target_vector, &vector),
                },
                Resolution::Unresolved => SimilarityMatch::NoEmbedding,
            };
            TokenSimilarity {
                token: token.text,
                original_index: token.original_index,
                matched,
            }
        })
        .collect();

    results.sort_by(|a, b| b.similarity().total_cmp(&a.similarity()));
    results
}

/// Perturbation impact of `target` inside centered windows of size 1..=max_n
/// around each of its occurrences, plus the total over all windows.
///
/// `max_ngram_size` is clamped to [`NGRAM_SIZE_LIMIT`].
pub fn contiguous_ngram_importance(
    text: &str,
    target: &str,
    max_ngram_size: usize,
    table: &EmbeddingTable,
) -> Result<NgramImportance> {
    let words = tokenize(text);
    if !table.contains(target) || words.is_empty() {
        return Ok(NgramImportance::default());
    }

    let target_lower = target.to_lowercase();
    let occurrences: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.to_lowercase() == target_lower)
        .map(|(i, _)| i)
        .collect();

    let max_n = max_ngram_size.min(NGRAM_SIZE_LIMIT);
    let mut impacts = Vec::new();
    for &target_idx in &occurrences {
        for n in 1..=max_n {
            let start = target_idx.saturating_sub((n - 1) / 2);
            let end = words.len().min(start + n);
            let window = &words[start..end];

            let Some(with_target) = average_of_words(window, table)? else {
                continue;
            };

            let without: Vec<&String> = window
                .iter()
                .enumerate()
                .filter(|(offset, _)| start + offset != target_idx)
                .map(|(_, w)| w)
                .collect();

            let impact = if without.is_empty() {
                MAX_IMPACT
            } else {
                match average_of_words(&without, table)? {
                    Some(without_target) => {
                        1.0 - cosine_similarity(&with_target, &without_target)
                    }
                    None => 0.0,
                }
            };

            impacts.push(NgramImpact {
                n_gram: window.join(" "),
                n,
                target_token_index: target_idx,
                impact,
            });
        }
    }

    Ok(NgramImportance {
        total_importance: impacts.iter().map(|i| i.impact).sum(),
        n_gram_impacts: impacts,
    })
}

/// Influence of every resolved token on every other: O(n²) pairs,
/// sorted strongest first.
pub fn pairwise_importance(text: &str, table: &EmbeddingTable) -> Result<Vec<PairInfluence>> {
    let words = tokenize(text);
    let resolved = ResolvedToken::collect(&Token::sequence(&words), table);

    let mut pairs = Vec::with_capacity(resolved.len() * resolved.len().saturating_sub(1));
    for a in &resolved {
        for b in &resolved {
            if a.original_index() == b.original_index() {
                continue;
            }
            pairs.push(PairInfluence {
                influencer: a.text().to_string(),
                influenced: b.text().to_string(),
                influence: pair_influence(&a.vector, &b.vector)?,
            });
        }
    }

    pairs.sort_by(|a, b| b.influence.total_cmp(&a.influence));
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> EmbeddingTable {
        EmbeddingTable::try_from(vec![
            ("cat", vec![1.0, 0.0]),
            ("dog", vec![0.0, 1.0]),
            ("kitten", vec![0.9, 0.1]),
            ("the", vec![1.0, 1.0]),
        ])
        .unwrap()
    }

    // --- target token importance ---

    #[test]
    fn test_target_missing_returns_empty() {
        assert!(target_token_importance("cat dog", "bird", &table()).is_empty());
    }

    #[test]
    fn test_target_sorted_by_similarity() {
        let results = target_token_importance("dog kitten cat", "cat", &table());
        let tokens: Vec<&str> = results.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, vec!["kitten", "dog"]);
        assert_relative_eq!(results[1].similarity(), 0.0);
    }

    #[test]
    fn test_target_lists_unknown_tokens_as_no_embedding() {
        let results = target_token_importance("cat zebra kitten", "cat", &table());
        let zebra = results.iter().find(|r| r.token == "zebra").unwrap();
        assert_eq!(zebra.matched, SimilarityMatch::NoEmbedding);
        assert_eq!(zebra.similarity(), 0.0);
        assert_eq!(zebra.original_index, 1);
    }

    #[test]
    fn test_target_earlier_repeat_kept_when_spelling_recurs() {
        let results = target_token_importance("cat dog cat", "cat", &table());
        let indices: Vec<usize> = results.iter().map(|r| r.original_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_relative_eq!(results[0].similarity(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_target_lookahead_is_case_sensitive() {
        for (text, target) in [("Cat dog cat", "CAT"), ("cat dog Cat", "cat")] {
            let results = target_token_importance(text, target, &table());
            let tokens: Vec<&str> = results.iter().map(|r| r.token.as_str()).collect();
            assert_eq!(tokens, vec!["dog"], "{text} / {target}");
        }
    }

    #[test]
    fn test_target_absent_from_sentence_compares_all() {
        let results = target_token_importance("dog kitten", "cat", &table());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_target_serializes_tagged() {
        let results = target_token_importance("cat zebra kitten", "cat", &table());
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json[0]["embedding"], "scored");
        assert!(json[0].get("similarity").is_some());
        assert_eq!(json[1]["embedding"], "no_embedding");
        assert!(json[1].get("originalIndex").is_some());
    }

    // --- contiguous n-gram importance ---

    #[test]
    fn test_ngram_missing_target() {
        let result = contiguous_ngram_importance("cat dog", "bird", 3, &table()).unwrap();
        assert_eq!(result, NgramImportance::default());
    }

    #[test]
    fn test_ngram_empty_sentence() {
        let result = contiguous_ngram_importance("", "cat", 3, &table()).unwrap();
        assert_eq!(result.total_importance, 0.0);
        assert!(result.n_gram_impacts.is_empty());
    }

    #[test]
    fn test_ngram_unigram_has_max_impact() {
        let result = contiguous_ngram_importance("the cat", "cat", 1, &table()).unwrap();
        assert_eq!(result.n_gram_impacts.len(), 1);
        assert_eq!(result.n_gram_impacts[0].n_gram, "cat");
        assert_eq!(result.n_gram_impacts[0].impact, 1.0);
        assert_eq!(result.total_importance, 1.0);
    }

    #[test]
    fn test_ngram_windows_clamped_and_centered() {
        let result = contiguous_ngram_importance("the cat dog", "cat", 3, &table()).unwrap();
        let grams: Vec<&str> = result
            .n_gram_impacts
            .iter()
            .map(|g| g.n_gram.as_str())
            .collect();
        assert_eq!(grams, vec!["cat", "cat dog", "the cat dog"]);
        assert!(result.n_gram_impacts.iter().all(|g| g.target_token_index == 1));
    }

    #[test]
    fn test_ngram_window_at_sentence_end() {
        let result = contiguous_ngram_importance("dog cat", "cat", 2, &table()).unwrap();
        // n=2 starts at the target and is clipped to one token
        assert_eq!(result.n_gram_impacts[1].n_gram, "cat");
        assert_eq!(result.n_gram_impacts[1].impact, 1.0);
    }

    #[test]
    fn test_ngram_two_token_impact() {
        let result = contiguous_ngram_importance("cat dog", "cat", 2, &table()).unwrap();
        let pair = &result.n_gram_impacts[1];
        assert_eq!(pair.n_gram, "cat dog");
        // avg (0.5, 0.5) vs (0, 1)
        assert_relative_eq!(pair.impact, 1.0 - 0.5f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(result.total_importance, 1.0 + pair.impact, epsilon = 1e-12);
    }

    #[test]
    fn test_ngram_unknown_neighbours_give_zero() {
        let result = contiguous_ngram_importance("cat zebra", "cat", 2, &table()).unwrap();
        assert_eq!(result.n_gram_impacts[1].n_gram, "cat zebra");
        assert_eq!(result.n_gram_impacts[1].impact, 0.0);
    }

    #[test]
    fn test_ngram_every_occurrence() {
        let result = contiguous_ngram_importance("cat dog cat", "cat", 2, &table()).unwrap();
        let targets: Vec<usize> = result
            .n_gram_impacts
            .iter()
            .map(|g| g.target_token_index)
            .collect();
        assert_eq!(targets, vec![0, 0, 2, 2]);
    }

    #[test]
    fn test_ngram_size_is_clamped() {
        let result = contiguous_ngram_importance("the cat dog", "cat", usize::MAX, &table()).unwrap();
        assert_eq!(result.n_gram_impacts.len(), NGRAM_SIZE_LIMIT);
        assert_eq!(result.n_gram_impacts.last().unwrap().n, NGRAM_SIZE_LIMIT);
        assert_eq!(result.n_gram_impacts.last().unwrap().n_gram, "the cat dog");
    }

    // --- pairwise importance ---

    #[test]
    fn test_pairwise_two_tokens() {
        let pairs = pairwise_importance("cat dog", &table()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|p| p.influencer == "cat" && p.influenced == "dog"));
        assert!(pairs.iter().any(|p| p.influencer == "dog" && p.influenced == "cat"));
    }

    #[test]
    fn test_pairwise_sorted_descending() {
        let pairs = pairwise_importance("cat dog kitten the", &table()).unwrap();
        assert_eq!(pairs.len(), 12);
        for w in pairs.windows(2) {
            assert!(w[0].influence >= w[1].influence);
        }
    }

    #[test]
    fn test_pairwise_ignores_unknown() {
        let pairs = pairwise_importance("cat zebra", &table()).unwrap();
        assert!(pairs.is_empty());
    }
}
