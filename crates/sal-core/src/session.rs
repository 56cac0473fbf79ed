use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analyzers::{
    NgramImportance, PairInfluence, TokenSimilarity, contiguous_ngram_importance,
    pairwise_importance, target_token_importance,
};
use crate::attention::{AsReport, run_as};
use crate::embedding::EmbeddingTable;
use crate::enhanced::{EasReport, run_eas};
use crate::error::Result;

/// The last AS or EAS report produced through a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisResult {
    As(AsReport),
    Eas(EasReport),
}

impl AnalysisResult {
    pub fn summary(&self) -> &str {
        match self {
            AnalysisResult::As(r) => &r.summary,
            AnalysisResult::Eas(r) => &r.summary,
        }
    }
}

/// Explicit analysis context: one embedding table plus the last result.
///
/// The table is shared read-only with every in-flight call; replacing it
/// swaps the `Arc` wholesale and never mutates a table a call is reading.
#[derive(Clone, Debug, Default)]
pub struct Session {
    table: Arc<EmbeddingTable>,
    last_result: Option<AnalysisResult>,
}

impl Session {
    pub fn new(table: EmbeddingTable) -> Self {
        Self {
            table: Arc::new(table),
            last_result: None,
        }
    }

    pub fn table(&self) -> Arc<EmbeddingTable> {
        Arc::clone(&self.table)
    }

    /// Swap in a new table. The last result is kept for inspection.
    pub fn replace_table(&mut self, table: EmbeddingTable) {
        self.table = Arc::new(table);
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    pub fn run_as(&mut self, text: &str, min_important_tokens: usize) -> Result<AsReport> {
        let report = run_as(text, &self.table, min_important_tokens)?;
        self.last_result = Some(AnalysisResult::As(report.clone()));
        Ok(report)
    }

    pub fn run_eas(&mut self, text: &str) -> Result<EasReport> {
        let report = run_eas(text, &self.table)?;
        self.last_result = Some(AnalysisResult::Eas(report.clone()));
        Ok(report)
    }

    pub fn target_token_importance(&self, text: &str, target: &str) -> Vec<TokenSimilarity> {
        target_token_importance(text, target, &self.table)
    }

    pub fn contiguous_ngram_importance(
        &self,
        text: &str,
        target: &str,
        max_ngram_size: usize,
    ) -> Result<NgramImportance> {
        contiguous_ngram_importance(text, target, max_ngram_size, &self.table)
    }

    pub fn pairwise_importance(&self, text: &str) -> Result<Vec<PairInfluence>> {
        pairwise_importance(text, &self.table)
    }
}
