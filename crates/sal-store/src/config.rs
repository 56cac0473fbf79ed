//! `sal.toml` configuration.
//!
//! ```toml
//! [embeddings]
//! source = "vectors/glove.6B.50d.txt"
//! case_fold = true
//!
//! [analysis]
//! min_important_tokens = 3
//! max_ngram_size = 6
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sal_core::{DEFAULT_MAX_NGRAM_SIZE, DEFAULT_MIN_IMPORTANT_TOKENS};
use serde::Deserialize;

use crate::error::{LoadError, Result};
use crate::loader::LoadOptions;

pub const CONFIG_FILE_NAME: &str = "sal.toml";
pub const CONFIG_ENV: &str = "SAL_CONFIG";
pub const EMBEDDINGS_ENV: &str = "SAL_EMBEDDINGS";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embeddings: EmbeddingsConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// File path or http(s) URL.
    pub source: Option<String>,
    pub case_fold: bool,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            source: None,
            case_fold: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_important_tokens: usize,
    pub max_ngram_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_important_tokens: DEFAULT_MIN_IMPORTANT_TOKENS,
            max_ngram_size: DEFAULT_MAX_NGRAM_SIZE,
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Load from `explicit`, else `$SAL_CONFIG`, else `./sal.toml` if present.
    /// Falls back to defaults when no file is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match config_path(explicit, env::var(CONFIG_ENV).ok()) {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Embedding source by priority: flag, `$SAL_EMBEDDINGS`, config file.
    pub fn embeddings_source(&self, flag: Option<&str>) -> Option<String> {
        pick_source(
            flag,
            env::var(EMBEDDINGS_ENV).ok(),
            self.embeddings.source.as_deref(),
        )
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            case_fold: self.embeddings.case_fold,
        }
    }
}

fn config_path(explicit: Option<&Path>, from_env: Option<String>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    local.is_file().then_some(local)
}

fn pick_source(
    flag: Option<&str>,
    from_env: Option<String>,
    from_config: Option<&str>,
) -> Option<String> {
    flag.map(str::to_string)
        .or(from_env.filter(|s| !s.is_empty()))
        .or(from_config.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.min_important_tokens, 3);
        assert_eq!(config.analysis.max_ngram_size, 6);
        assert!(config.embeddings.case_fold);
        assert!(config.embeddings.source.is_none());
    }

    #[test]
    fn test_full_file() {
        let config = Config::parse(
            r#"
            [embeddings]
            source = "vectors.txt"
            case_fold = false

            [analysis]
            min_important_tokens = 5
            max_ngram_size = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.embeddings.source.as_deref(), Some("vectors.txt"));
        assert!(!config.load_options().case_fold);
        assert_eq!(config.analysis.min_important_tokens, 5);
        assert_eq!(config.analysis.max_ngram_size, 2);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = Config::parse("[analysis]\nmax_ngram_size = 4\n").unwrap();
        assert_eq!(config.analysis.min_important_tokens, 3);
        assert_eq!(config.analysis.max_ngram_size, 4);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::parse("[analysis\n").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[embeddings]\nsource = \"a.txt\"\n").unwrap();
        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.embeddings.source.as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::discover(Some(Path::new("/nonexistent/sal.toml"))).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_config_path_priority() {
        let explicit = PathBuf::from("/x/explicit.toml");
        assert_eq!(
            config_path(Some(&explicit), Some("/y/env.toml".into())),
            Some(explicit)
        );
        assert_eq!(
            config_path(None, Some("/y/env.toml".into())),
            Some(PathBuf::from("/y/env.toml"))
        );
    }

    #[test]
    fn test_source_priority() {
        assert_eq!(
            pick_source(Some("flag.txt"), Some("env.txt".into()), Some("cfg.txt")),
            Some("flag.txt".into())
        );
        assert_eq!(
            pick_source(None, Some("env.txt".into()), Some("cfg.txt")),
            Some("env.txt".into())
        );
        assert_eq!(
            pick_source(None, Some(String::new()), Some("cfg.txt")),
            Some("cfg.txt".into())
        );
        assert_eq!(pick_source(None, None, None), None);
    }
}
