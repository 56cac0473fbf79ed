use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use sal_core::{AnalysisResult, Session, tokenize};
use sal_store::{Config, LoadOptions, parse_embeddings};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::source::EmbeddingSource;

#[derive(Clone)]
pub struct SalServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    session: Session,
    config: Config,
}

impl SalServer {
    pub fn new(session: Session, config: Config) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState { session, config })),
            tool_router: Self::tool_router(),
        }
    }

    fn stats_json(session: &Session) -> serde_json::Value {
        let table = session.table();
        let last_mode = session.last_result().map(|r| match r {
            AnalysisResult::As(_) => "as",
            AnalysisResult::Eas(_) => "eas",
        });
        serde_json::json!({
            "entries": table.len(),
            "dimension": table.dimension(),
            "last_result": last_mode,
        })
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn analysis_error(e: sal_core::CoreError) -> McpError {
    McpError::internal_error(format!("analysis failed: {e}"), None)
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct LoadEmbeddingsRequest {
    /// File path or http(s) URL of a `<token> <f_1> ... <f_k>` embedding file
    source: Option<String>,
    /// Inline embedding text in the same line format (used when no source is given)
    text: Option<String>,
    /// Lowercase keys at load time. Defaults to the configured value.
    case_fold: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TextRequest {
    /// Text to analyze
    text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AsRequest {
    /// Text to analyze
    text: String,
    /// Minimum number of important tokens to select. Defaults to the configured value.
    min_important_tokens: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TargetRequest {
    /// Text to analyze
    text: String,
    /// Token whose relation to the rest of the text is measured
    target: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NgramRequest {
    /// Text to analyze
    text: String,
    /// Token whose windows are perturbed
    target: String,
    /// Largest window size. Defaults to the configured value.
    max_ngram_size: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PairwiseRequest {
    /// Text to analyze
    text: String,
    /// Only return the strongest N pairs
    top: Option<usize>,
}

#[tool_router]
impl SalServer {
    #[tool(
        description = "Load a word embedding table, replacing the current one. Give either `source` (file path or http(s) URL) or `text` (inline lines of `<token> <f_1> ... <f_k>`). Returns line counts and the new table size."
    )]
    async fn sal_load_embeddings(
        &self,
        Parameters(req): Parameters<LoadEmbeddingsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let options = {
            let state = self.state.lock().await;
            LoadOptions {
                case_fold: req
                    .case_fold
                    .unwrap_or(state.config.embeddings.case_fold),
            }
        };

        // Fetch outside the lock so analyses keep running on the old table.
        let (table, report) = match (req.source.as_deref(), req.text.as_deref()) {
            (Some(source), _) => EmbeddingSource::parse(source)
                .load(options)
                .await
                .map_err(|e| McpError::invalid_params(format!("{e:#}"), None))?,
            (None, Some(text)) => parse_embeddings(text, options),
            (None, None) => {
                return Err(McpError::invalid_params(
                    "either `source` or `text` is required",
                    None,
                ));
            }
        };

        let mut state = self.state.lock().await;
        state.session.replace_table(table);
        tracing::info!(entries = state.session.table().len(), "embedding table replaced");

        json_result(&serde_json::json!({
            "report": report,
            "stats": Self::stats_json(&state.session),
        }))
    }

    #[tool(description = "Embedding table statistics: entry count, dimension, and the mode of the last AS/EAS result.")]
    async fn sal_stats(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        json_result(&Self::stats_json(&state.session))
    }

    #[tool(description = "Split text into tokens. Punctuation (. , ! ? ; :) and emoji become separate tokens.")]
    async fn sal_tokenize(
        &self,
        Parameters(req): Parameters<TextRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&tokenize(&req.text))
    }

    #[tool(
        description = "Attention-and-Synthesis: score each token by how much the sentence's mean embedding turns when it is removed (1 - cosine similarity), and select the important tokens."
    )]
    async fn sal_as(
        &self,
        Parameters(req): Parameters<AsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let min = req
            .min_important_tokens
            .unwrap_or(state.config.analysis.min_important_tokens);
        let report = state
            .session
            .run_as(&req.text, min)
            .map_err(analysis_error)?;
        json_result(&report)
    }

    #[tool(
        description = "Enhanced Attention-and-Synthesis: run AS, then measure how each attention token pulls every other token's embedding, and average the influence received per token."
    )]
    async fn sal_eas(
        &self,
        Parameters(req): Parameters<TextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let report = state.session.run_eas(&req.text).map_err(analysis_error)?;
        json_result(&report)
    }

    #[tool(description = "Cosine similarity between a target token and every other token in the text, most similar first.")]
    async fn sal_token_importance(
        &self,
        Parameters(req): Parameters<TargetRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        json_result(&state.session.target_token_importance(&req.text, &req.target))
    }

    #[tool(
        description = "Importance of a target token inside centered windows of size 1..max_ngram_size around each occurrence, with the total over all windows."
    )]
    async fn sal_ngram_importance(
        &self,
        Parameters(req): Parameters<NgramRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let max_n = req
            .max_ngram_size
            .unwrap_or(state.config.analysis.max_ngram_size);
        let result = state
            .session
            .contiguous_ngram_importance(&req.text, &req.target, max_n)
            .map_err(analysis_error)?;
        json_result(&result)
    }

    #[tool(description = "Influence of every token on every other token in the text, strongest first.")]
    async fn sal_pairwise(
        &self,
        Parameters(req): Parameters<PairwiseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let mut pairs = state
            .session
            .pairwise_importance(&req.text)
            .map_err(analysis_error)?;
        if let Some(top) = req.top {
            pairs.truncate(top);
        }
        json_result(&pairs)
    }

    #[tool(description = "Return the last AS or EAS result produced by this server, or null.")]
    async fn sal_last_result(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        json_result(&state.session.last_result())
    }
}

#[tool_handler]
impl ServerHandler for SalServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Token salience over word embeddings.\n\n\
                 1. Load a table with sal_load_embeddings (path, URL, or inline text) unless one \
                    was configured at startup; sal_stats shows what is loaded.\n\
                 2. sal_as highlights the tokens that carry a sentence's meaning; sal_eas adds \
                    per-token influence weights on top of that selection.\n\
                 3. sal_token_importance, sal_ngram_importance and sal_pairwise answer narrower \
                    questions about one target token or all token pairs.\n\n\
                 Tokens without an embedding are ignored by the scoring; an empty table yields \
                 empty results rather than errors."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
