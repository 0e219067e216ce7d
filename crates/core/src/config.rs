use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    OpenAi,
    /// Deterministic in-process feature hashing; no network, no key.
    Hashing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub embedding_provider: Option<EmbeddingProvider>,
    pub retrieval_top_k: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://offersense.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProvider::Hashing,
                api_key: None,
                base_url: None,
                model: "text-embedding-3-small".to_string(),
                dimensions: 256,
                timeout_secs: 30,
            },
            retrieval: RetrievalConfig { top_k: 5 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8090,
                health_check_port: 8091,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "hashing" => Ok(Self::Hashing),
            other => Err(ConfigError::Validation(format!(
                "unsupported embedding provider `{other}` (expected openai|hashing)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("offersense.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(embedding) = patch.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if let Some(api_key_value) = embedding.api_key {
                self.embedding.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = embedding.base_url {
                self.embedding.base_url = Some(base_url);
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
            if let Some(timeout_secs) = embedding.timeout_secs {
                self.embedding.timeout_secs = timeout_secs;
            }
        }

        if let Some(retrieval) = patch.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.retrieval.top_k = top_k;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("OFFERSENSE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("OFFERSENSE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("OFFERSENSE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("OFFERSENSE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("OFFERSENSE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("OFFERSENSE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("OFFERSENSE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("OFFERSENSE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("OFFERSENSE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("OFFERSENSE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("OFFERSENSE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("OFFERSENSE_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("OFFERSENSE_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("OFFERSENSE_EMBEDDING_PROVIDER") {
            self.embedding.provider = value.parse()?;
        }
        if let Some(value) = read_env("OFFERSENSE_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("OFFERSENSE_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(value);
        }
        if let Some(value) = read_env("OFFERSENSE_EMBEDDING_MODEL") {
            self.embedding.model = value;
        }
        if let Some(value) = read_env("OFFERSENSE_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions =
                parse_u32("OFFERSENSE_EMBEDDING_DIMENSIONS", &value)? as usize;
        }

        if let Some(value) = read_env("OFFERSENSE_RETRIEVAL_TOP_K") {
            self.retrieval.top_k = parse_u32("OFFERSENSE_RETRIEVAL_TOP_K", &value)? as usize;
        }

        if let Some(value) = read_env("OFFERSENSE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("OFFERSENSE_SERVER_PORT") {
            self.server.port = parse_u16("OFFERSENSE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("OFFERSENSE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("OFFERSENSE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("OFFERSENSE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("OFFERSENSE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("OFFERSENSE_LOGGING_LEVEL").or_else(|| read_env("OFFERSENSE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("OFFERSENSE_LOGGING_FORMAT").or_else(|| read_env("OFFERSENSE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(embedding_provider) = overrides.embedding_provider {
            self.embedding.provider = embedding_provider;
        }
        if let Some(top_k) = overrides.retrieval_top_k {
            self.retrieval.top_k = top_k;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_embedding(&self.embedding)?;
        validate_retrieval(&self.retrieval)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("offersense.toml"), PathBuf::from("config/offersense.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    // Hosted providers need a key; a local Ollama endpoint does not.
    if llm.provider != LlmProvider::Ollama {
        let has_key =
            llm.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty());
        if !has_key {
            return Err(ConfigError::Validation(format!(
                "llm.api_key is required for provider {:?}",
                llm.provider
            )));
        }
    }

    Ok(())
}

fn validate_embedding(embedding: &EmbeddingConfig) -> Result<(), ConfigError> {
    if embedding.dimensions < 8 || embedding.dimensions > 8192 {
        return Err(ConfigError::Validation(
            "embedding.dimensions must be in range 8..=8192".to_string(),
        ));
    }

    if embedding.provider == EmbeddingProvider::OpenAi {
        let has_key = embedding
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty());
        if !has_key {
            return Err(ConfigError::Validation(
                "embedding.api_key is required for provider OpenAi".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_retrieval(retrieval: &RetrievalConfig) -> Result<(), ConfigError> {
    if retrieval.top_k == 0 || retrieval.top_k > 100 {
        return Err(ConfigError::Validation(
            "retrieval.top_k must be in range 1..=100".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    match logging.level.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        other => Err(ConfigError::Validation(format!(
            "logging.level `{other}` is not one of trace|debug|info|warn|error"
        ))),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    embedding: Option<EmbeddingPatch>,
    retrieval: Option<RetrievalPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingPatch {
    provider: Option<EmbeddingProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievalPatch {
    top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
