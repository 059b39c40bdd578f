//! Shared handler state
//!
//! Services are held behind traits so the router can be driven with any
//! storage backend.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::account::{Account, AccountId, AccountRepository};
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;
use crate::infrastructure::account::{AccountService, SignInProfile};
use crate::infrastructure::api_key::{
    ApiKeyService, CreateApiKeyRequest, UpdateApiKeyRequest, ValidatedKey,
};
use crate::infrastructure::auth::JwtGenerator;
use crate::infrastructure::storage::ping;
use crate::infrastructure::summarizer::{Summarized, SummarizerService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub summarizer_service: Arc<dyn SummarizerServiceTrait>,
    pub jwt_service: Arc<dyn JwtGenerator>,
    pub readiness: Arc<dyn ReadinessCheck>,
    /// Shared secret expected in `x-identity-secret` on sign-in
    pub identity_secret: Option<String>,
}

impl AppState {
    pub fn new(
        api_key_service: Arc<dyn ApiKeyServiceTrait>,
        account_service: Arc<dyn AccountServiceTrait>,
        summarizer_service: Arc<dyn SummarizerServiceTrait>,
        jwt_service: Arc<dyn JwtGenerator>,
        readiness: Arc<dyn ReadinessCheck>,
    ) -> Self {
        Self {
            api_key_service,
            account_service,
            summarizer_service,
            jwt_service,
            readiness,
            identity_secret: None,
        }
    }

    pub fn with_identity_secret(mut self, identity_secret: Option<String>) -> Self {
        self.identity_secret = identity_secret.filter(|s| !s.is_empty());
        self
    }
}

/// Trait for API key management and validation
#[async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn create(
        &self,
        owner: &Account,
        request: CreateApiKeyRequest,
    ) -> Result<ApiKey, DomainError>;
    async fn list(&self, owner: &AccountId) -> Result<Vec<ApiKey>, DomainError>;
    async fn get(&self, owner: &AccountId, id: &ApiKeyId) -> Result<ApiKey, DomainError>;
    async fn update(
        &self,
        owner: &AccountId,
        id: &ApiKeyId,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKey, DomainError>;
    async fn delete(&self, owner: &AccountId, id: &ApiKeyId) -> Result<(), DomainError>;
    async fn validate(&self, secret: &str) -> Result<ValidatedKey, DomainError>;
}

/// Trait for account lookups and sign-in
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn sign_in(&self, profile: SignInProfile) -> Result<Account, DomainError>;
    async fn get_by_email(&self, email: &str) -> Result<Account, DomainError>;
}

/// Trait for the summarizer flow
#[async_trait]
pub trait SummarizerServiceTrait: Send + Sync {
    async fn handle(&self, secret: &str, repository_url: &str) -> Result<Summarized, DomainError>;
}

/// Dependency check behind `/health/ready`
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self) -> Result<(), DomainError>;
}

#[async_trait]
impl<R: ApiKeyRepository + 'static> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn create(
        &self,
        owner: &Account,
        request: CreateApiKeyRequest,
    ) -> Result<ApiKey, DomainError> {
        ApiKeyService::create(self, owner, request).await
    }

    async fn list(&self, owner: &AccountId) -> Result<Vec<ApiKey>, DomainError> {
        ApiKeyService::list(self, owner).await
    }

    async fn get(&self, owner: &AccountId, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        ApiKeyService::get(self, owner, id).await
    }

    async fn update(
        &self,
        owner: &AccountId,
        id: &ApiKeyId,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKey, DomainError> {
        ApiKeyService::update(self, owner, id, request).await
    }

    async fn delete(&self, owner: &AccountId, id: &ApiKeyId) -> Result<(), DomainError> {
        ApiKeyService::delete(self, owner, id).await
    }

    async fn validate(&self, secret: &str) -> Result<ValidatedKey, DomainError> {
        ApiKeyService::validate(self, secret).await
    }
}

#[async_trait]
impl<R: AccountRepository + 'static> AccountServiceTrait for AccountService<R> {
    async fn sign_in(&self, profile: SignInProfile) -> Result<Account, DomainError> {
        AccountService::sign_in(self, profile).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, DomainError> {
        AccountService::get_by_email(self, email).await
    }
}

#[async_trait]
impl<R: ApiKeyRepository + 'static> SummarizerServiceTrait for SummarizerService<R> {
    async fn handle(&self, secret: &str, repository_url: &str) -> Result<Summarized, DomainError> {
        SummarizerService::handle(self, secret, repository_url).await
    }
}

/// Readiness of the PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresReadiness {
    pool: PgPool,
}

impl PostgresReadiness {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessCheck for PostgresReadiness {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<(), DomainError> {
        ping(&self.pool).await
    }
}

/// In-memory storage is always reachable
#[derive(Debug, Clone, Default)]
pub struct InMemoryReadiness;

#[async_trait]
impl ReadinessCheck for InMemoryReadiness {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn check(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
