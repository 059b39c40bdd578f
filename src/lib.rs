//! Repository Summarizer Gateway
//!
//! Issues API keys to signed-in accounts, enforces a per-key monthly quota,
//! and serves GitHub repository summaries to callers holding a valid key.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use crate::api::state::{AppState, InMemoryReadiness, PostgresReadiness, ReadinessCheck};
use crate::config::{StorageBackend, StorageConfig};
use crate::domain::{AccountRepository, ApiKeyRepository};
use crate::infrastructure::{
    account::{AccountService, InMemoryAccountRepository, PostgresAccountRepository},
    api_key::{
        ApiKeyGenerator, ApiKeyService, InMemoryApiKeyRepository, PostgresApiKeyRepository,
    },
    auth::{JwtConfig, JwtService},
    github::GitHubClient,
    llm::{ChatReadmeSummarizer, HttpClient},
    storage::{connect_pool, run_migrations, PostgresConfig},
    summarizer::SummarizerService,
};
use tracing::{info, warn};

/// Create the application state for the configured storage backend
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    info!("Storage backend: {:?}", config.storage.backend);

    match config.storage.backend {
        StorageBackend::Postgres => {
            let pg_config = postgres_config(&config.storage).ok_or_else(|| {
                anyhow::anyhow!("storage.database_url is required for the postgres backend")
            })?;

            info!("Connecting to PostgreSQL...");
            let pool = connect_pool(&pg_config).await?;

            let applied = run_migrations(&pool).await?;
            info!(applied, "Database schema up to date");

            build_state(
                config,
                Arc::new(PostgresApiKeyRepository::new(pool.clone())),
                Arc::new(PostgresAccountRepository::new(pool.clone())),
                Arc::new(PostgresReadiness::new(pool)),
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage: keys and usage are lost on restart");

            build_state(
                config,
                Arc::new(InMemoryApiKeyRepository::new()),
                Arc::new(InMemoryAccountRepository::new()),
                Arc::new(InMemoryReadiness),
            )
        }
    }
}

/// Pool settings from the storage section, if a database URL is set
pub(crate) fn postgres_config(storage: &StorageConfig) -> Option<PostgresConfig> {
    let url = storage.database_url.as_deref()?.trim();
    if url.is_empty() {
        return None;
    }

    Some(
        PostgresConfig::new(url)
            .with_max_connections(storage.max_connections)
            .with_min_connections(storage.min_connections)
            .with_connect_timeout(storage.connect_timeout_secs),
    )
}

fn build_state<K, A>(
    config: &AppConfig,
    key_repository: Arc<K>,
    account_repository: Arc<A>,
    readiness: Arc<dyn ReadinessCheck>,
) -> anyhow::Result<AppState>
where
    K: ApiKeyRepository + 'static,
    A: AccountRepository + 'static,
{
    let generator = ApiKeyGenerator::new(&config.api_keys.prefix)
        .with_key_bytes(config.api_keys.key_bytes);

    let api_key_service = ApiKeyService::new(Arc::clone(&key_repository))
        .with_generator(generator)
        .with_quota_policy(config.plans.quota_policy());

    let fetcher = GitHubClient::new(Duration::from_secs(config.github.timeout_secs))?
        .with_base_url(&config.github.base_url)
        .with_token(config.github.token.clone())
        .with_user_agent(&config.github.user_agent);

    if config.summarizer.api_key.trim().is_empty() {
        warn!("summarizer.api_key is not set; summarization requests will fail");
    }

    let http_client = HttpClient::with_timeout(Duration::from_secs(config.summarizer.timeout_secs))?;
    let summarizer = ChatReadmeSummarizer::new(http_client, &config.summarizer.api_key)
        .with_base_url(&config.summarizer.base_url)
        .with_model(&config.summarizer.model)
        .with_temperature(config.summarizer.temperature);

    let summarizer_service =
        SummarizerService::new(key_repository, Arc::new(fetcher), Arc::new(summarizer));

    let jwt_service = JwtService::new(JwtConfig::new(
        &config.session.secret,
        config.session.expiration_hours,
    ));

    if config.session.identity_secret.is_none() {
        warn!("session.identity_secret is not set; sign-in is disabled");
    }

    Ok(AppState::new(
        Arc::new(api_key_service),
        Arc::new(AccountService::new(account_repository)),
        Arc::new(summarizer_service),
        Arc::new(jwt_service),
        readiness,
    )
    .with_identity_secret(config.session.identity_secret.clone()))
}
