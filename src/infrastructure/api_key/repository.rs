//! In-memory API key repository implementation
//!
//! Intended for development and tests. Not shared between processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::AccountId;
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

/// In-memory implementation of ApiKeyRepository
#[derive(Debug)]
pub struct InMemoryApiKeyRepository {
    keys: Arc<RwLock<HashMap<ApiKeyId, ApiKey>>>,
    secret_index: Arc<RwLock<HashMap<String, ApiKeyId>>>,
}

impl InMemoryApiKeyRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
            secret_index: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryApiKeyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(id).cloned())
    }

    async fn get_by_secret(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        let secret_index = self.secret_index.read().await;

        Ok(secret_index.get(secret).and_then(|id| keys.get(id)).cloned())
    }

    async fn list_by_owner(&self, owner: &AccountId) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;

        let mut result: Vec<ApiKey> = keys
            .values()
            .filter(|k| k.is_owned_by(owner))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(result)
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;
        let mut secret_index = self.secret_index.write().await;

        if keys.contains_key(api_key.id()) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                api_key.id()
            )));
        }

        if secret_index.contains_key(api_key.secret()) {
            return Err(DomainError::conflict("API key secret already exists"));
        }

        secret_index.insert(api_key.secret().to_string(), *api_key.id());
        keys.insert(*api_key.id(), api_key.clone());

        Ok(api_key)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;

        let stored = keys.get_mut(api_key.id()).ok_or_else(|| {
            DomainError::not_found(format!("API key '{}' not found", api_key.id()))
        })?;

        stored.set_name(api_key.name());
        stored.set_monthly_limit(api_key.monthly_limit());

        Ok(stored.clone())
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let mut keys = self.keys.write().await;
        let mut secret_index = self.secret_index.write().await;

        if let Some(key) = keys.remove(id) {
            secret_index.remove(key.secret());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn increment_usage_if_below_limit(
        &self,
        id: &ApiKeyId,
    ) -> Result<Option<u64>, DomainError> {
        // Check and increment under one write lock
        let mut keys = self.keys.write().await;

        Ok(keys.get_mut(id).and_then(|key| key.try_consume()))
    }
}
