use std::fs;
use std::path::Path;

use sal_core::{CoreError, EmbeddingTable};
use serde::Serialize;

use crate::error::{LoadError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Lowercase keys at load time so they match case-folded lookups.
    pub case_fold: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { case_fold: true }
    }
}

/// Line counts from one parse.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub accepted: usize,
    pub overwritten: usize,
    pub skipped_header: usize,
    pub skipped_short: usize,
    pub skipped_malformed: usize,
    pub skipped_dimension: usize,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.skipped_short + self.skipped_malformed + self.skipped_dimension
    }
}

/// `<count> <dim>` header line written by word2vec-style exporters.
fn is_header(fields: &[&str]) -> bool {
    fields.len() == 2 && fields.iter().all(|f| f.parse::<usize>().is_ok())
}

/// Parse `<token> <f_1> ... <f_k>` lines into a table.
///
/// Blank lines and lines with fewer than two fields are skipped, as are
/// lines with a non-numeric component or a dimension that disagrees with
/// the first accepted line. A repeated key overwrites the earlier entry.
pub fn parse_embeddings(text: &str, options: LoadOptions) -> (EmbeddingTable, LoadReport) {
    let mut table = EmbeddingTable::new();
    let mut report = LoadReport::default();
    let mut first_record = true;

    for (line_no, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if first_record {
            first_record = false;
            if is_header(&fields) {
                report.skipped_header += 1;
                continue;
            }
        }
        if fields.len() < 2 {
            report.skipped_short += 1;
            continue;
        }

        let vector: std::result::Result<Vec<f32>, _> =
            fields[1..].iter().map(|f| f.parse::<f32>()).collect();
        let Ok(vector) = vector else {
            tracing::debug!(line = line_no + 1, "skipping embedding line with non-numeric component");
            report.skipped_malformed += 1;
            continue;
        };

        let key = if options.case_fold {
            fields[0].to_lowercase()
        } else {
            fields[0].to_string()
        };

        match table.insert(key, vector) {
            Ok(replaced) => {
                report.accepted += 1;
                if replaced {
                    report.overwritten += 1;
                }
            }
            Err(CoreError::DimensionMismatch { expected, found }) => {
                tracing::debug!(
                    line = line_no + 1,
                    expected,
                    found,
                    "skipping embedding line with wrong dimension"
                );
                report.skipped_dimension += 1;
            }
            Err(e) => {
                tracing::debug!(line = line_no + 1, "skipping embedding line: {e}");
                report.skipped_malformed += 1;
            }
        }
    }

    if report.skipped() > 0 {
        tracing::warn!(
            skipped = report.skipped(),
            accepted = report.accepted,
            "some embedding lines were skipped"
        );
    }
    tracing::info!(
        entries = table.len(),
        dimension = table.dimension().unwrap_or(0),
        "parsed embeddings"
    );

    (table, report)
}

/// Read and parse an embedding file.
pub fn load_file(path: &Path, options: LoadOptions) -> Result<(EmbeddingTable, LoadReport)> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_embeddings(&text, options))
}

/// Like [`load_file`], but an unreadable source yields an empty table.
pub fn load_file_or_empty(path: &Path, options: LoadOptions) -> EmbeddingTable {
    match load_file(path, options) {
        Ok((table, _)) => table,
        Err(e) => {
            tracing::error!("{e}; continuing with an empty embedding table");
            EmbeddingTable::new()
        }
    }
}
