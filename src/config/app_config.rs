use serde::Deserialize;

use crate::domain::QuotaPolicy;
use crate::infrastructure::api_key::{DEFAULT_KEY_BYTES, DEFAULT_KEY_PREFIX};
use crate::infrastructure::github::DEFAULT_GITHUB_BASE_URL;
use crate::infrastructure::llm::{DEFAULT_SUMMARIZER_BASE_URL, DEFAULT_SUMMARIZER_MODEL};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub api_keys: ApiKeysConfig,
    pub github: GitHubConfig,
    pub summarizer: SummarizerConfig,
    pub plans: PlansConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local maps. Data is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HS256 signing secret for session tokens
    pub secret: String,
    pub expiration_hours: u64,
    /// Shared secret the identity front end presents on sign-in.
    /// Sign-in is refused for everyone when unset.
    pub identity_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    pub prefix: String,
    pub key_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Default monthly allowance per plan tier. Absent means unlimited.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlansConfig {
    pub development_monthly_limit: Option<u64>,
    pub production_monthly_limit: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiration_hours: 24,
            identity_secret: None,
        }
    }
}

impl Default for ApiKeysConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            key_bytes: DEFAULT_KEY_BYTES,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITHUB_BASE_URL.to_string(),
            token: None,
            user_agent: env!("CARGO_PKG_NAME").to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SUMMARIZER_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_SUMMARIZER_MODEL.to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl PlansConfig {
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy::new(
            self.development_monthly_limit,
            self.production_monthly_limit,
        )
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject combinations the server cannot start with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.storage.backend == StorageBackend::Postgres
            && self
                .storage
                .database_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(config::ConfigError::Message(
                "storage.database_url is required for the postgres backend".to_string(),
            ));
        }

        if self.session.secret.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "session.secret must be set".to_string(),
            ));
        }

        if self.session.expiration_hours == 0 {
            return Err(config::ConfigError::Message(
                "session.expiration_hours must be positive".to_string(),
            ));
        }

        if self.api_keys.prefix.is_empty() || self.api_keys.key_bytes < 16 {
            return Err(config::ConfigError::Message(
                "api_keys needs a non-empty prefix and at least 16 random bytes".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
