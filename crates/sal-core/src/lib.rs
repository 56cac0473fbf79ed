//! Perturbation-based token salience engine.
//!
//! Scores how much each token of a sentence carries its meaning by removing
//! it and measuring how far the averaged word-vector representation moves
//! (cosine distance). Two engines build on the same primitives:
//! Attention-and-Synthesis (AS), a leave-one-out pass over the sentence, and
//! Enhanced Attention-and-Synthesis (EAS), which layers pairwise influence
//! gradients on top of the AS selection.
//!
//! Zero I/O: embedding tables are handed in by the caller.

pub mod analyzers;
pub mod attention;
pub mod constants;
pub mod embedding;
pub mod enhanced;
pub mod error;
pub mod session;
pub mod token;
pub mod tokenizer;
pub mod vector;

pub use analyzers::{
    NgramImpact, NgramImportance, PairInfluence, SimilarityMatch, TokenSimilarity,
    contiguous_ngram_importance, pairwise_importance, target_token_importance,
};
pub use attention::{AsReport, AsStatus, run_as};
pub use constants::{
    DEFAULT_MAX_NGRAM_SIZE, DEFAULT_MIN_IMPORTANT_TOKENS, EAS_SUMMARY_TOP, NGRAM_SIZE_LIMIT,
};
pub use embedding::{EmbeddingTable, average_of_words};
pub use enhanced::{EasReport, FinalWeight, Influence, run_eas};
pub use error::{CoreError, Result};
pub use session::{AnalysisResult, Session};
pub use token::{Resolution, ResolvedToken, Token, TokenImpact};
pub use tokenizer::tokenize;
pub use vector::{average, cosine_similarity, dot, jaccard_overlap, magnitude};
