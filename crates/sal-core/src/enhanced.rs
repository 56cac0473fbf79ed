//! Enhanced Attention-and-Synthesis (EAS).
//!
//! Runs AS, then for every attention token A and every other resolved token B
//! measures how far the pair mean `avg(A, B)` pulls away from B:
//! `influence(A→B) = 1 - cos(avg(A, B), B)`. Influences received by each
//! token text are averaged into a final weight.
//!
//! Weights are keyed by token *text*, not position: repeated words share one
//! weight. AS itself is strictly per position, so repeated words can rank
//! differently between the two views.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::attention::{AsReport, elapsed_ms, run_as_full};
use crate::constants::{DEFAULT_MIN_IMPORTANT_TOKENS, EAS_SUMMARY_TOP, WEIGHT_PRECISION};
use crate::embedding::EmbeddingTable;
use crate::error::Result;
use crate::token::ScoredToken;
use crate::vector::{average, cosine_similarity};

const NO_ATTENTION_TOKENS: &str = "EAS analysis could not be completed: no attention tokens found.";

/// Influence an attention token exerts on one other token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub token: String,
    pub influence: f64,
}

/// Averaged influence received by one token text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalWeight {
    pub token: String,
    pub weight: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EasReport {
    pub summary: String,
    #[serde(rename = "globalAS")]
    pub global_as: AsReport,
    pub attention_tokens: Vec<String>,
    /// Attention token text → influence on every other resolved token.
    pub gradients: BTreeMap<String, Vec<Influence>>,
    /// Sorted by weight, descending.
    pub final_weights: Vec<FinalWeight>,
    #[serde(rename = "executionTime")]
    pub execution_time_ms: f64,
}

/// One A→B measurement.
struct PairRecord<'a> {
    influencer: &'a ScoredToken,
    influenced: &'a ScoredToken,
    influence: f64,
}

/// Running (sum, count) per influenced token text.
type Accumulator = BTreeMap<String, (f64, usize)>;

/// Run EAS on `text`. Uses the default AS floor for the attention set.
pub fn run_eas(text: &str, table: &EmbeddingTable) -> Result<EasReport> {
    let started = Instant::now();
    let run = run_as_full(text, table, DEFAULT_MIN_IMPORTANT_TOKENS)?;

    if run.important.is_empty() {
        return Ok(EasReport {
            summary: NO_ATTENTION_TOKENS.to_string(),
            global_as: run.report,
            attention_tokens: Vec::new(),
            gradients: BTreeMap::new(),
            final_weights: Vec::new(),
            execution_time_ms: elapsed_ms(started),
        });
    }

    let pairs = influence_pairs(&run.important, &run.scored)?;
    let gradients = collect_gradients(&run.important, &pairs);
    let accumulated = accumulate(&pairs);
    let final_weights = final_weights(&run.important, accumulated);

    Ok(EasReport {
        summary: summarize(&final_weights),
        global_as: run.report,
        attention_tokens: run
            .important
            .iter()
            .map(|s| s.resolved.text().to_string())
            .collect(),
        gradients,
        final_weights,
        execution_time_ms: elapsed_ms(started),
    })
}

/// Every (attention, other) pair with distinct positions. O(|attention| × |resolved|).
fn influence_pairs<'a>(
    attention: &'a [ScoredToken],
    resolved: &'a [ScoredToken],
) -> Result<Vec<PairRecord<'a>>> {
    let mut pairs = Vec::with_capacity(attention.len() * resolved.len());
    for a in attention {
        for b in resolved {
            if a.resolved.original_index() == b.resolved.original_index() {
                continue;
            }
            pairs.push(PairRecord {
                influencer: a,
                influenced: b,
                influence: pair_influence(&a.resolved.vector, &b.resolved.vector)?,
            });
        }
    }
    Ok(pairs)
}

/// `1 - cos(avg(a, b), b)`: how much `a` pulls `b` off its own direction.
pub(crate) fn pair_influence(a: &[f64], b: &[f64]) -> Result<f64> {
    Ok(match average(&[a, b])? {
        Some(pair) => 1.0 - cosine_similarity(&pair, b),
        None => 0.0,
    })
}

/// Influence lists keyed by attention token text. A repeated attention word
/// keeps the list of its last occurrence.
fn collect_gradients(
    attention: &[ScoredToken],
    pairs: &[PairRecord<'_>],
) -> BTreeMap<String, Vec<Influence>> {
    let mut gradients = BTreeMap::new();
    for a in attention {
        let gradient: Vec<Influence> = pairs
            .iter()
            .filter(|p| p.influencer.resolved.original_index() == a.resolved.original_index())
            .map(|p| Influence {
                token: p.influenced.resolved.text().to_string(),
                influence: p.influence,
            })
            .collect();
        gradients.insert(a.resolved.text().to_string(), gradient);
    }
    gradients
}

fn accumulate(pairs: &[PairRecord<'_>]) -> Accumulator {
    pairs.iter().fold(Accumulator::new(), |mut acc, pair| {
        let entry = acc
            .entry(pair.influenced.resolved.text().to_string())
            .or_insert((0.0, 0));
        entry.0 += pair.influence;
        entry.1 += 1;
        acc
    })
}

/// Mean influence per token text; attention tokens never influenced by
/// anything fall back to their AS impact.
fn final_weights(attention: &[ScoredToken], accumulated: Accumulator) -> Vec<FinalWeight> {
    let mut weights: Vec<FinalWeight> = accumulated
        .iter()
        .map(|(token, (sum, count))| FinalWeight {
            token: token.clone(),
            weight: if *count > 0 { sum / *count as f64 } else { 0.0 },
        })
        .collect();

    let mut seen: HashSet<&str> = accumulated.keys().map(String::as_str).collect();
    for a in attention {
        if seen.insert(a.resolved.text()) {
            weights.push(FinalWeight {
                token: a.resolved.text().to_string(),
                weight: a.impact,
            });
        }
    }

    weights.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    weights
}

fn summarize(weights: &[FinalWeight]) -> String {
    let top: Vec<String> = weights
        .iter()
        .take(EAS_SUMMARY_TOP)
        .map(|w| format!("{} ({:.prec$})", w.token, w.weight, prec = WEIGHT_PRECISION))
        .collect();
    format!("Top tokens by influence: {}.", top.join(", "))
}
