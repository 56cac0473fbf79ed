//! Embedding sources: local files or http(s) URLs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sal_core::EmbeddingTable;
use sal_store::{LoadOptions, LoadReport, load_file, parse_embeddings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingSource {
    File(PathBuf),
    Url(String),
}

impl EmbeddingSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            EmbeddingSource::Url(source.to_string())
        } else {
            EmbeddingSource::File(PathBuf::from(source))
        }
    }

    pub async fn load(&self, options: LoadOptions) -> Result<(EmbeddingTable, LoadReport)> {
        match self {
            EmbeddingSource::File(path) => Ok(load_file(path, options)?),
            EmbeddingSource::Url(url) => {
                let text = fetch_text(url).await?;
                Ok(parse_embeddings(&text, options))
            }
        }
    }
}

async fn fetch_text(url: &str) -> Result<String> {
    tracing::debug!("fetching embeddings from {url}");
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("bad response from {url}"))?;
    response
        .text()
        .await
        .with_context(|| format!("failed to read body from {url}"))
}

/// Load `source` if given; any failure is logged and yields an empty table.
pub async fn load_or_empty(source: Option<&str>, options: LoadOptions) -> EmbeddingTable {
    let Some(source) = source else {
        tracing::warn!("no embedding source configured; every token will be unknown");
        return EmbeddingTable::new();
    };
    match EmbeddingSource::parse(source).load(options).await {
        Ok((table, report)) => {
            tracing::info!(
                entries = table.len(),
                skipped = report.skipped(),
                "loaded embeddings from {source}"
            );
            table
        }
        Err(e) => {
            tracing::error!("failed to load embeddings from {source}: {e:#}");
            EmbeddingTable::new()
        }
    }
}
