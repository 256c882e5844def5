//! Environment-driven configuration for Cora.
//!
//! Settings are loaded and validated once at startup (via `init_config`) and exposed as a
//! global, read-only view through `get_config`. The configuration powers the HTTP server and
//! the indexer CLI and covers:
//!
//! - Ollama connectivity (`OLLAMA_HOST`, `MODEL_NAME`, `EMBEDDING_MODEL`,
//!   `EMBEDDING_DIMENSION`).
//! - Qdrant connectivity (`QDRANT_URL`, `QDRANT_COLLECTION_NAME`, `QDRANT_API_KEY?`).
//! - Translator service (`TRANSLATOR_API_URL?`, `TRANSLATOR_TIMEOUT_SECONDS?`).
//! - Session behavior (`SESSION_TTL_SECONDS?`, `MAX_TURNS?`).
//! - Indexing knobs (`CHUNK_SIZE?`, `CHUNK_OVERLAP?`, `UPSERT_BATCH_SIZE?`).
//! - Retrieval knobs (`SEARCH_DEFAULT_LIMIT?`, `SEARCH_SCORE_THRESHOLD?`).
//! - HTTP server port (`SERVER_PORT?`).
//!
//! Every key has a default, so the process starts with an empty environment; invalid
//! combinations are flagged early with descriptive errors.
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Collection holding the knowledge base unless overridden by `QDRANT_COLLECTION_NAME`.
pub const DEFAULT_COLLECTION_NAME: &str = "rayied_knowledge_base";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Cora server and indexer.
#[derive(Debug)]
pub struct Config {
    /// Base URL of the Ollama runtime serving generation and embeddings.
    pub ollama_host: String,
    /// Default generative model identifier.
    pub model_name: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Base URL of the Qdrant instance holding the knowledge base.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for indexed records.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Optional base URL of the translation service; translation is a no-op when unset.
    pub translator_api_url: Option<String>,
    /// Hard ceiling applied to every translator call.
    pub translator_timeout: Duration,
    /// Idle duration after which a session expires.
    pub session_ttl: Duration,
    /// Number of user/assistant pairs included in any single prompt.
    pub max_turns: usize,
    /// Target chunk size in characters for long documents.
    pub chunk_size: usize,
    /// Overlap in characters between adjacent chunks.
    pub chunk_overlap: usize,
    /// Maximum number of records submitted to the store per upsert call.
    pub upsert_batch_size: usize,
    /// Default number of hits returned by retrieval.
    pub search_default_limit: usize,
    /// Default similarity threshold applied to retrieval hits.
    pub search_score_threshold: f32,
    /// HTTP server port.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_dimension = load_usize_with_default("EMBEDDING_DIMENSION", 768)?;
        let chunk_size = load_usize_with_default("CHUNK_SIZE", 1000)?;
        let chunk_overlap = load_usize_with_default("CHUNK_OVERLAP", 150)?;
        let upsert_batch_size = load_usize_with_default("UPSERT_BATCH_SIZE", 64)?;
        let search_default_limit = load_usize_with_default("SEARCH_DEFAULT_LIMIT", 3)?;
        let search_score_threshold = load_f32_with_default("SEARCH_SCORE_THRESHOLD", 0.3)?;
        let max_turns = load_usize_with_default("MAX_TURNS", 20)?;

        if embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue(
                "EMBEDDING_DIMENSION must be at least 1".into(),
            ));
        }
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue(
                "CHUNK_SIZE must be at least 1".into(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::InvalidValue(
                "CHUNK_OVERLAP must be smaller than CHUNK_SIZE".into(),
            ));
        }
        if upsert_batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "UPSERT_BATCH_SIZE must be at least 1".into(),
            ));
        }
        if search_default_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "SEARCH_DEFAULT_LIMIT must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&search_score_threshold) {
            return Err(ConfigError::InvalidValue(
                "SEARCH_SCORE_THRESHOLD must be between 0.0 and 1.0".into(),
            ));
        }
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_TURNS must be at least 1".into(),
            ));
        }

        Ok(Self {
            ollama_host: load_env_with_default("OLLAMA_HOST", "http://127.0.0.1:11434"),
            model_name: load_env_with_default("MODEL_NAME", "llama3.1"),
            embedding_model: load_env_with_default("EMBEDDING_MODEL", "nomic-embed-text"),
            embedding_dimension,
            qdrant_url: load_env_with_default("QDRANT_URL", "http://127.0.0.1:6333"),
            qdrant_collection_name: load_env_with_default(
                "QDRANT_COLLECTION_NAME",
                DEFAULT_COLLECTION_NAME,
            ),
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            translator_api_url: load_env_optional("TRANSLATOR_API_URL"),
            translator_timeout: Duration::from_secs(load_u64_with_default(
                "TRANSLATOR_TIMEOUT_SECONDS",
                5,
            )?),
            session_ttl: Duration::from_secs(load_u64_with_default("SESSION_TTL_SECONDS", 1800)?),
            max_turns,
            chunk_size,
            chunk_overlap,
            upsert_batch_size,
            search_default_limit,
            search_score_threshold,
            server_port: load_u16_with_default("SERVER_PORT", 8001)?,
        })
    }
}

fn load_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_f32_with_default(key: &str, default: f32) -> Result<f32, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_env_with_default(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        ollama_host = %config.ollama_host,
        model = %config.model_name,
        embedding_model = %config.embedding_model,
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        translator = ?config.translator_api_url,
        session_ttl_secs = config.session_ttl.as_secs(),
        max_turns = config.max_turns,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        server_port = config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
