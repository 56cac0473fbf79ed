pub mod config;
pub mod error;
pub mod loader;

pub use config::{AnalysisConfig, Config, EmbeddingsConfig};
pub use error::{LoadError, Result};
pub use loader::{LoadOptions, LoadReport, load_file, load_file_or_empty, parse_embeddings};
