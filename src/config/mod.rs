//! Application configuration

mod app_config;

pub use app_config::{
    ApiKeysConfig, AppConfig, GitHubConfig, LogFormat, LoggingConfig, PlansConfig, ServerConfig,
    SessionConfig, StorageBackend, StorageConfig, SummarizerConfig,
};
