//! Attention-and-Synthesis (AS): leave-one-out perturbation over a sentence.
//!
//! Each resolved token is scored by how far the sentence's mean vector turns
//! when that token is removed: `impact = 1 - cos(baseline, leave_one_out)`.
//! Tokens above the mean impact are important; if that leaves fewer than the
//! requested minimum, the top-N by impact are taken instead.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::constants::{IMPACT_PRECISION, MAX_IMPACT};
use crate::embedding::EmbeddingTable;
use crate::error::Result;
use crate::token::{ResolvedToken, ScoredToken, Token, TokenImpact};
use crate::tokenizer::tokenize;
use crate::vector::{average, cosine_similarity};

pub(crate) const NO_TOKENS: &str = "No tokens to process.";
pub(crate) const NO_KNOWN_TOKENS: &str = "No known tokens found in embeddings.";
const NO_KNOWN_TOKENS_RELATIONS: &str = "No known tokens for analysis.";
const NOTHING_IMPORTANT: &str = "No tokens highlighted as important.";
const RELATIONS_HEADER: &str =
    "Token impact analysis (higher value means more sentence meaning changes with removal):";

/// Outcome class of an AS run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsStatus {
    Complete,
    NoTokens,
    NoKnownTokens,
}

/// Caller-facing AS result. Never carries embedding vectors.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsReport {
    pub status: AsStatus,
    pub summary: String,
    pub relations_analysis: String,
    pub tokens: Vec<String>,
    pub token_count: usize,
    pub token_impacts: Vec<TokenImpact>,
    pub important_tokens: Vec<TokenImpact>,
    #[serde(rename = "executionTime")]
    pub execution_time_ms: f64,
}

impl AsReport {
    fn degenerate(
        status: AsStatus,
        summary: &str,
        relations: &str,
        tokens: Vec<String>,
        started: Instant,
    ) -> Self {
        Self {
            status,
            summary: summary.to_string(),
            relations_analysis: relations.to_string(),
            token_count: tokens.len(),
            tokens,
            token_impacts: Vec::new(),
            important_tokens: Vec::new(),
            execution_time_ms: elapsed_ms(started),
        }
    }
}

/// Full AS output with vectors still attached, consumed by EAS.
pub(crate) struct AsRun {
    pub report: AsReport,
    /// Every resolved token with its impact, in reading order.
    pub scored: Vec<ScoredToken>,
    /// The important subset, in reading order.
    pub important: Vec<ScoredToken>,
}

pub(crate) fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Run AS on `text` and return the stripped report.
pub fn run_as(text: &str, table: &EmbeddingTable, min_important_tokens: usize) -> Result<AsReport> {
    Ok(run_as_full(text, table, min_important_tokens)?.report)
}

pub(crate) fn run_as_full(
    text: &str,
    table: &EmbeddingTable,
    min_important_tokens: usize,
) -> Result<AsRun> {
    let started = Instant::now();
    let words = tokenize(text);

    if words.is_empty() {
        return Ok(AsRun {
            report: AsReport::degenerate(AsStatus::NoTokens, NO_TOKENS, "N/A", words, started),
            scored: Vec::new(),
            important: Vec::new(),
        });
    }

    let resolved = ResolvedToken::collect(&Token::sequence(&words), table);
    if resolved.is_empty() {
        return Ok(AsRun {
            report: AsReport::degenerate(
                AsStatus::NoKnownTokens,
                NO_KNOWN_TOKENS,
                NO_KNOWN_TOKENS_RELATIONS,
                words,
                started,
            ),
            scored: Vec::new(),
            important: Vec::new(),
        });
    }

    let scored = score_leave_one_out(resolved)?;
    let important = select_important(&scored, min_important_tokens);

    let summary = if important.is_empty() {
        NOTHING_IMPORTANT.to_string()
    } else {
        important
            .iter()
            .map(|s| s.resolved.text())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let report = AsReport {
        status: AsStatus::Complete,
        summary,
        relations_analysis: relations_report(&scored),
        token_count: words.len(),
        tokens: words,
        token_impacts: scored.iter().map(ScoredToken::strip).collect(),
        important_tokens: important.iter().map(ScoredToken::strip).collect(),
        execution_time_ms: elapsed_ms(started),
    };

    Ok(AsRun {
        report,
        scored,
        important,
    })
}

/// Score every token by leave-one-out cosine distance to the sentence mean.
/// Leave-one-out means come from the running sum, so the pass is O(n·d).
fn score_leave_one_out(resolved: Vec<ResolvedToken>) -> Result<Vec<ScoredToken>> {
    let vectors: Vec<&[f64]> = resolved.iter().map(|r| r.vector.as_slice()).collect();
    // average() validates that every vector shares one dimension.
    let Some(baseline) = average(&vectors)? else {
        return Ok(Vec::new());
    };

    let n = resolved.len();
    if n == 1 {
        return Ok(resolved
            .into_iter()
            .map(|resolved| ScoredToken {
                resolved,
                impact: MAX_IMPACT,
            })
            .collect());
    }

    let sum: Vec<f64> = baseline.iter().map(|x| x * n as f64).collect();
    let rest = (n - 1) as f64;

    Ok(resolved
        .into_iter()
        .map(|resolved| {
            let leave_one_out: Vec<f64> = sum
                .iter()
                .zip(&resolved.vector)
                .map(|(s, v)| (s - v) / rest)
                .collect();
            let impact = 1.0 - cosine_similarity(&baseline, &leave_one_out);
            ScoredToken { resolved, impact }
        })
        .collect())
}

/// Tokens above the mean impact, topped up to `min_important` by impact rank.
/// Result is in reading order.
fn select_important(scored: &[ScoredToken], min_important: usize) -> Vec<ScoredToken> {
    if scored.is_empty() {
        return Vec::new();
    }
    let mean = scored.iter().map(|s| s.impact).sum::<f64>() / scored.len() as f64;

    let mut important: Vec<ScoredToken> = scored
        .iter()
        .filter(|s| s.impact > mean)
        .cloned()
        .collect();

    if important.len() < min_important {
        let take = min_important.min(scored.len());
        let mut by_impact: Vec<&ScoredToken> = scored.iter().collect();
        // Stable sort: equal impacts keep reading order.
        by_impact.sort_by(|a, b| b.impact.total_cmp(&a.impact));
        important = by_impact.into_iter().take(take).cloned().collect();
    }

    important.sort_by_key(|s| s.resolved.original_index());
    important
}

fn relations_report(scored: &[ScoredToken]) -> String {
    let mut text = String::from(RELATIONS_HEADER);
    text.push('\n');
    for s in scored {
        text.push_str(&format!(
            "- '{}' (position {}): impact {:.prec$}\n",
            s.resolved.text(),
            s.resolved.original_index(),
            s.impact,
            prec = IMPACT_PRECISION,
        ));
    }
    text
}
