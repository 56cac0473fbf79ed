use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingTable;

/// A token and its position in the tokenized sentence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub text: String,
    pub original_index: usize,
}

impl Token {
    /// Number tokens in reading order.
    pub fn sequence(words: &[String]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(original_index, text)| Token {
                text: text.clone(),
                original_index,
            })
            .collect()
    }

    pub fn resolve(&self, table: &EmbeddingTable) -> Resolution {
        match table.resolve(&self.text) {
            Some(vector) => Resolution::Resolved { vector },
            None => Resolution::Unresolved,
        }
    }
}

/// Whether a token has an embedding in the current table.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Resolved { vector: Vec<f64> },
    Unresolved,
}

/// A token with its full-precision vector.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedToken {
    pub token: Token,
    pub vector: Vec<f64>,
}

impl ResolvedToken {
    /// Keep only tokens that resolve against `table`, preserving order.
    pub fn collect(tokens: &[Token], table: &EmbeddingTable) -> Vec<ResolvedToken> {
        tokens
            .iter()
            .filter_map(|token| match token.resolve(table) {
                Resolution::Resolved { vector } => Some(ResolvedToken {
                    token: token.clone(),
                    vector,
                }),
                Resolution::Unresolved => None,
            })
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.token.text
    }

    pub fn original_index(&self) -> usize {
        self.token.original_index
    }
}

/// Per-token score as handed to callers. Carries no vector payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenImpact {
    pub token: String,
    pub original_index: usize,
    pub impact: f64,
}

/// Scored token that still holds its vector, used between AS and EAS.
#[derive(Clone, Debug)]
pub(crate) struct ScoredToken {
    pub resolved: ResolvedToken,
    pub impact: f64,
}

impl ScoredToken {
    pub fn strip(&self) -> TokenImpact {
        TokenImpact {
            token: self.resolved.token.text.clone(),
            original_index: self.resolved.token.original_index,
            impact: self.impact,
        }
    }
}
