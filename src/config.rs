use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ARXIV_URL: &str = "https://export.arxiv.org/api/query";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Startup configuration, loaded once from config.yml. Required keys are
/// startup-fatal when absent; the rest fall back to defaults. The Qdrant
/// and embedding fields are consumed by the external indexing pipeline and
/// are only validated for presence here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data_path: PathBuf,
    pub qdrant_url: String,
    pub collection_name: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub llm_name: String,
    pub llm_url: String,
    #[serde(default = "default_arxiv_url")]
    pub arxiv_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_arxiv_url() -> String {
    DEFAULT_ARXIV_URL.to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cache_capacity() -> u64 {
    1_000
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Creates the paper download folder if it does not exist yet.
    pub fn ensure_data_folder(&self) -> std::io::Result<()> {
        if !self.data_path.exists() {
            std::fs::create_dir_all(&self.data_path)?;
            tracing::info!(path = %self.data_path.display(), "data folder created");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
data_path: ./data
qdrant_url: http://localhost:6333
collection_name: researchpapers
embedding_model: BAAI/bge-small-en-v1.5
chunk_size: 512
llm_name: research_assistant
llm_url: http://localhost:11434
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg: Config = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(cfg.arxiv_url, DEFAULT_ARXIV_URL);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.cache_capacity, 1_000);
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let err = serde_yaml::from_str::<Config>("data_path: ./data\n").unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn load_reads_yaml_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(MINIMAL.as_bytes()).unwrap();
        let cfg = Config::load(f.path()).unwrap();
        assert_eq!(cfg.llm_name, "research_assistant");
    }
}
