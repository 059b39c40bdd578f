//! Key validation gate
//!
//! Resolves a presented secret to the key it belongs to.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::account::AccountId;
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

/// Identity behind a valid secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedKey {
    pub key_id: ApiKeyId,
    /// Absent only for legacy keys created before ownership was recorded
    pub owner: Option<AccountId>,
}

impl From<&ApiKey> for ValidatedKey {
    fn from(key: &ApiKey) -> Self {
        Self {
            key_id: *key.id(),
            owner: key.owner().copied(),
        }
    }
}

/// Looks keys up by secret equality
#[derive(Debug)]
pub struct ValidationGate<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
}

impl<R: ApiKeyRepository> ValidationGate<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Find the key for a secret. Empty secrets never match.
    ///
    /// Keys without an owner are still returned: they predate ownership and
    /// remain usable, but each use is logged.
    pub async fn resolve(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let secret = secret.trim();

        if secret.is_empty() {
            return Ok(None);
        }

        let key = self.repository.get_by_secret(secret).await?;

        match &key {
            Some(key) if key.owner().is_none() => {
                warn!(key_id = %key.id(), "API key has no owning account, accepting legacy key");
            }
            Some(key) => debug!(key_id = %key.id(), "API key resolved"),
            None => debug!("No API key matches the presented secret"),
        }

        Ok(key)
    }

    /// Validate a secret, failing with `InvalidKey` when nothing matches
    pub async fn validate(&self, secret: &str) -> Result<ValidatedKey, DomainError> {
        self.resolve(secret)
            .await?
            .as_ref()
            .map(ValidatedKey::from)
            .ok_or(DomainError::InvalidKey)
    }
}
