use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Two settings are individually valid but mutually inconsistent.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Runtime configuration for the Docquery server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores chunk embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for chunk storage.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Base URL of the Ollama runtime serving both models.
    pub ollama_url: String,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Generation model identifier used for answer synthesis.
    pub generation_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub search_top_k: usize,
    /// Timeout applied to each embedding call, in seconds.
    pub embed_timeout_secs: u64,
    /// Timeout applied to each generation call, in seconds.
    pub generate_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 100;
const DEFAULT_SEARCH_TOP_K: usize = 5;
const MAX_SEARCH_TOP_K: usize = 12;
const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 120;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_collection_name: load_env("QDRANT_COLLECTION_NAME")?,
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            generation_model: load_env("GENERATION_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            chunk_size: parse_optional("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_optional("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            search_top_k: parse_optional("SEARCH_TOP_K", DEFAULT_SEARCH_TOP_K)?,
            embed_timeout_secs: parse_optional("EMBED_TIMEOUT_SECS", DEFAULT_EMBED_TIMEOUT_SECS)?,
            generate_timeout_secs: parse_optional(
                "GENERATE_TIMEOUT_SECS",
                DEFAULT_GENERATE_TIMEOUT_SECS,
            )?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that individual parsing cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Inconsistent(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.search_top_k == 0 {
            return Err(ConfigError::InvalidValue("SEARCH_TOP_K".into()));
        }
        Ok(())
    }

    /// Retrieval depth clamped to the supported range.
    pub fn effective_top_k(&self) -> usize {
        self.search_top_k.min(MAX_SEARCH_TOP_K)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Load configuration from the environment, reading a `.env` file when present.
pub fn init_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        ollama_url = %config.ollama_url,
        embedding_model = %config.embedding_model,
        generation_model = %config.generation_model,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            qdrant_url: "http://127.0.0.1:6333".into(),
            qdrant_collection_name: "documents".into(),
            qdrant_api_key: None,
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            embedding_model: "nomic-embed-text".into(),
            generation_model: "llama3".into(),
            embedding_dimension: 768,
            chunk_size: 500,
            chunk_overlap: 100,
            search_top_k: 5,
            embed_timeout_secs: 30,
            generate_timeout_secs: 120,
            server_port: None,
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_overlap_not_smaller_than_chunk_size() {
        let mut config = base_config();
        config.chunk_overlap = config.chunk_size;
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::Inconsistent(_)));
    }

    #[test]
    fn validate_rejects_zero_dimension() {
        let mut config = base_config();
        config.embedding_dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_top_k_is_clamped() {
        let mut config = base_config();
        config.search_top_k = 40;
        assert_eq!(config.effective_top_k(), 12);
        config.search_top_k = 7;
        assert_eq!(config.effective_top_k(), 7);
    }
}
