/// Minimum size of the AS important-token selection before the top-N fallback kicks in.
pub const DEFAULT_MIN_IMPORTANT_TOKENS: usize = 3;

/// Largest contiguous window considered by the n-gram analyzer.
pub const DEFAULT_MAX_NGRAM_SIZE: usize = 6;

/// Hard ceiling on the n-gram window size; larger requests are clamped.
pub const NGRAM_SIZE_LIMIT: usize = 64;

/// Number of weights listed in the EAS summary line.
pub const EAS_SUMMARY_TOP: usize = 5;

/// Decimal places used for impact values in the AS relations report.
pub const IMPACT_PRECISION: usize = 4;

/// Decimal places used for weights in the EAS summary line.
pub const WEIGHT_PRECISION: usize = 3;

/// Impact assigned when removing a token leaves nothing to compare against.
pub const MAX_IMPACT: f64 = 1.0;
