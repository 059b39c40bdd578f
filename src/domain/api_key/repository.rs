//! API Key repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::account::AccountId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for API key storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Get an API key by its full secret (the authentication lookup)
    async fn get_by_secret(&self, secret: &str) -> Result<Option<ApiKey>, DomainError>;

    /// List keys owned by an account, newest first
    async fn list_by_owner(&self, owner: &AccountId) -> Result<Vec<ApiKey>, DomainError>;

    /// Persist a new API key. Fails with a conflict on a duplicate secret.
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Persist name and monthly limit changes. Never touches usage.
    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError>;

    /// Delete an API key, returning whether a row was removed
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// Atomically add one to usage if the key exists and is below its
    /// monthly limit. Returns the new usage, or None when nothing changed.
    async fn increment_usage_if_below_limit(
        &self,
        id: &ApiKeyId,
    ) -> Result<Option<u64>, DomainError>;
}
