use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::retrieval::{DEFAULT_EMBEDDING_ENDPOINT, DEFAULT_EMBEDDING_MODEL};
use crate::rules::DEFAULT_RULESET_CACHE_CAPACITY;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the decision service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which embedding provider retrieval validation asks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Sentence embeddings from an Ollama-compatible endpoint, falling back
    /// to hashed terms when the endpoint cannot embed.
    Http,
    /// Hashed term vectors only; needs no model or network.
    Hashed,
}

impl EmbeddingBackend {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" | "ollama" => Ok(Self::Http),
            "hashed" => Ok(Self::Hashed),
            _ => Err(ConfigError::InvalidChoice {
                key: "EMBEDDING_PROVIDER",
                value: raw.to_string(),
                expected: "http or hashed",
            }),
        }
    }
}

/// Where rulesets and audit records live, and how retrieval validation runs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub rules_dir: PathBuf,
    pub audit_log_path: PathBuf,
    pub retrieval_top_k: usize,
    pub embedding_dimensions: usize,
    pub retrieval_enabled: bool,
    pub embedding_provider: EmbeddingBackend,
    pub embedding_endpoint: String,
    pub embedding_model: String,
    pub cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("rules"),
            audit_log_path: PathBuf::from("logs/decision_logs.jsonl"),
            retrieval_top_k: 3,
            embedding_dimensions: 384,
            retrieval_enabled: true,
            embedding_provider: EmbeddingBackend::Http,
            embedding_endpoint: DEFAULT_EMBEDDING_ENDPOINT.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            cache_capacity: DEFAULT_RULESET_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let rules_dir = env::var("RULES_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.rules_dir);
        let audit_log_path = env::var("AUDIT_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.audit_log_path);

        let retrieval_top_k = match env::var("RETRIEVAL_TOP_K") {
            Ok(raw) => parse_positive("RETRIEVAL_TOP_K", &raw)?,
            Err(_) => defaults.retrieval_top_k,
        };
        let embedding_dimensions = match env::var("EMBEDDING_DIMENSIONS") {
            Ok(raw) => parse_positive("EMBEDDING_DIMENSIONS", &raw)?,
            Err(_) => defaults.embedding_dimensions,
        };
        let retrieval_enabled = match env::var("RETRIEVAL_ENABLED") {
            Ok(raw) => parse_flag("RETRIEVAL_ENABLED", &raw)?,
            Err(_) => defaults.retrieval_enabled,
        };
        let embedding_provider = match env::var("EMBEDDING_PROVIDER") {
            Ok(raw) => EmbeddingBackend::parse(&raw)?,
            Err(_) => defaults.embedding_provider,
        };
        let embedding_endpoint =
            env::var("EMBEDDING_ENDPOINT").unwrap_or(defaults.embedding_endpoint);
        let embedding_model = env::var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model);
        let cache_capacity = match env::var("RULESET_CACHE_CAPACITY") {
            Ok(raw) => parse_positive("RULESET_CACHE_CAPACITY", &raw)? as u64,
            Err(_) => defaults.cache_capacity,
        };

        Ok(Self {
            rules_dir,
            audit_log_path,
            retrieval_top_k,
            embedding_dimensions,
            retrieval_enabled,
            embedding_provider,
            embedding_endpoint,
            embedding_model,
            cache_capacity,
        })
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidFlag { key: &'static str, value: String },
    InvalidChoice {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer (found '{value}')")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false (found '{value}')")
            }
            ConfigError::InvalidChoice {
                key,
                value,
                expected,
            } => write!(f, "{key} must be {expected} (found '{value}')"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidChoice { .. } => None,
        }
    }
}
