//! API Key service
//!
//! Key issuance and owner-scoped management, plus secret validation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::account::{Account, AccountId, PlanTier, QuotaPolicy};
use crate::domain::api_key::{validate_key_name, ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

use super::gate::{ValidatedKey, ValidationGate};
use super::generator::ApiKeyGenerator;

/// Message used for both missing and foreign keys so ownership never leaks
pub const KEY_NOT_FOUND: &str = "API key not found or unauthorized";

/// Request to create a new API key
#[derive(Debug, Clone, Default)]
pub struct CreateApiKeyRequest {
    pub name: String,
    /// Explicit limit. When absent the plan default applies.
    pub monthly_limit: Option<u64>,
    /// Tier for the key. Defaults to the owner's plan.
    pub key_type: Option<PlanTier>,
}

/// Request to update an existing API key
#[derive(Debug, Clone, Default)]
pub struct UpdateApiKeyRequest {
    pub name: String,
    /// `None` leaves the limit unchanged, `Some(None)` removes it
    pub monthly_limit: Option<Option<u64>>,
}

/// API Key service for managing API keys
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    generator: ApiKeyGenerator,
    quota_policy: QuotaPolicy,
    gate: ValidationGate<R>,
}

impl<R: ApiKeyRepository> ApiKeyService<R> {
    /// Create a new API key service
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            gate: ValidationGate::new(Arc::clone(&repository)),
            repository,
            generator: ApiKeyGenerator::default(),
            quota_policy: QuotaPolicy::unlimited(),
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Create with per-tier default limits
    pub fn with_quota_policy(mut self, quota_policy: QuotaPolicy) -> Self {
        self.quota_policy = quota_policy;
        self
    }

    /// Issue a new key for an account. The returned record carries the full
    /// secret.
    pub async fn create(
        &self,
        owner: &Account,
        request: CreateApiKeyRequest,
    ) -> Result<ApiKey, DomainError> {
        let name = validate_key_name(&request.name)?;
        let key_type = request.key_type.unwrap_or_else(|| owner.plan());
        let monthly_limit = self.quota_policy.resolve(key_type, request.monthly_limit);

        info!(
            "Creating API key: owner={}, name={}, type={}",
            owner.id(),
            name,
            key_type
        );

        let api_key = ApiKey::new(name, self.generator.generate(), *owner.id())
            .with_type(key_type)
            .with_monthly_limit(monthly_limit);

        let created = self.repository.create(api_key).await?;

        info!("API key created: id={}", created.id());

        Ok(created)
    }

    /// List keys owned by an account, newest first
    pub async fn list(&self, owner: &AccountId) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list_by_owner(owner).await
    }

    /// Get a key, treating keys of other accounts as missing
    pub async fn get(&self, owner: &AccountId, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        match self.repository.get(id).await? {
            Some(key) if key.is_owned_by(owner) => Ok(key),
            Some(_) => {
                debug!(key_id = %id, account_id = %owner, "API key requested by non-owner");
                Err(DomainError::not_found(KEY_NOT_FOUND))
            }
            None => Err(DomainError::not_found(KEY_NOT_FOUND)),
        }
    }

    /// Rename a key and optionally change its limit
    pub async fn update(
        &self,
        owner: &AccountId,
        id: &ApiKeyId,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKey, DomainError> {
        let name = validate_key_name(&request.name)?;
        let mut key = self.get(owner, id).await?;

        info!("Updating API key: id={}", id);

        key.set_name(name);

        if let Some(monthly_limit) = request.monthly_limit {
            key.set_monthly_limit(monthly_limit);
        }

        self.repository.update(&key).await
    }

    /// Delete a key. Its secret stops validating immediately.
    pub async fn delete(&self, owner: &AccountId, id: &ApiKeyId) -> Result<(), DomainError> {
        self.get(owner, id).await?;

        info!("Deleting API key: id={}", id);

        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(KEY_NOT_FOUND))
        }
    }

    /// Check that a secret belongs to an existing key
    pub async fn validate(&self, secret: &str) -> Result<ValidatedKey, DomainError> {
        self.gate.validate(secret).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;

    fn create_service() -> ApiKeyService<InMemoryApiKeyRepository> {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        ApiKeyService::new(repo).with_generator(ApiKeyGenerator::new("test_"))
    }

    fn create_request(name: &str) -> CreateApiKeyRequest {
        CreateApiKeyRequest {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_api_key() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");

        let key = service.create(&owner, create_request("CI")).await.unwrap();

        assert!(key.secret().starts_with("test_"));
        assert_eq!(key.name(), "CI");
        assert_eq!(key.usage(), 0);
        assert_eq!(key.monthly_limit(), None);
        assert!(key.is_owned_by(owner.id()));
    }

    #[tokio::test]
    async fn test_created_secrets_are_unique() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");

        let mut secrets = HashSet::new();
        for i in 0..50 {
            let key = service
                .create(&owner, create_request(&format!("key-{}", i)))
                .await
                .unwrap();
            assert!(secrets.insert(key.secret().to_string()));
        }
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");

        let result = service.create(&owner, create_request("  ")).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));

        assert!(service.list(owner.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names_allowed() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");

        service.create(&owner, create_request("same")).await.unwrap();
        service.create(&owner, create_request("same")).await.unwrap();

        assert_eq!(service.list(owner.id()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_quota_policy_defaults() {
        let service = create_service().with_quota_policy(QuotaPolicy::new(Some(100), Some(10_000)));
        let owner = Account::new("ada@example.com", "Ada");

        let dev = service.create(&owner, create_request("dev")).await.unwrap();
        assert_eq!(dev.key_type(), PlanTier::Development);
        assert_eq!(dev.monthly_limit(), Some(100));

        let prod = service
            .create(
                &owner,
                CreateApiKeyRequest {
                    name: "prod".to_string(),
                    monthly_limit: None,
                    key_type: Some(PlanTier::Production),
                },
            )
            .await
            .unwrap();
        assert_eq!(prod.monthly_limit(), Some(10_000));

        let explicit = service
            .create(
                &owner,
                CreateApiKeyRequest {
                    name: "explicit".to_string(),
                    monthly_limit: Some(3),
                    key_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(explicit.monthly_limit(), Some(3));
    }

    #[tokio::test]
    async fn test_get_and_list_are_owner_scoped() {
        let service = create_service();
        let alice = Account::new("alice@example.com", "Alice");
        let bob = Account::new("bob@example.com", "Bob");

        let key = service.create(&alice, create_request("alice's")).await.unwrap();

        assert!(service.get(alice.id(), key.id()).await.is_ok());
        assert!(matches!(
            service.get(bob.id(), key.id()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(service.list(bob.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_by_owner() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");
        let key = service.create(&owner, create_request("old")).await.unwrap();

        let updated = service
            .update(
                owner.id(),
                key.id(),
                UpdateApiKeyRequest {
                    name: "new".to_string(),
                    monthly_limit: Some(Some(50)),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name(), "new");
        assert_eq!(updated.monthly_limit(), Some(50));

        let unchanged_limit = service
            .update(
                owner.id(),
                key.id(),
                UpdateApiKeyRequest {
                    name: "newer".to_string(),
                    monthly_limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(unchanged_limit.monthly_limit(), Some(50));

        let cleared = service
            .update(
                owner.id(),
                key.id(),
                UpdateApiKeyRequest {
                    name: "newest".to_string(),
                    monthly_limit: Some(None),
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.monthly_limit(), None);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_not_found() {
        let service = create_service();
        let alice = Account::new("alice@example.com", "Alice");
        let mallory = Account::new("mallory@example.com", "Mallory");
        let key = service.create(&alice, create_request("alice's")).await.unwrap();

        let result = service
            .update(
                mallory.id(),
                key.id(),
                UpdateApiKeyRequest {
                    name: "pwned".to_string(),
                    monthly_limit: Some(None),
                },
            )
            .await;

        match result {
            Err(DomainError::NotFound { message }) => assert_eq!(message, KEY_NOT_FOUND),
            other => panic!("expected NotFound, got {:?}", other),
        }

        let stored = service.get(alice.id(), key.id()).await.unwrap();
        assert_eq!(stored.name(), "alice's");
    }

    #[tokio::test]
    async fn test_update_requires_name() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");
        let key = service.create(&owner, create_request("named")).await.unwrap();

        let result = service
            .update(owner.id(), key.id(), UpdateApiKeyRequest::default())
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_validate_after_delete_is_invalid() {
        let service = create_service();
        let owner = Account::new("ada@example.com", "Ada");
        let key = service.create(&owner, create_request("temp")).await.unwrap();

        assert!(service.validate(key.secret()).await.is_ok());

        service.delete(owner.id(), key.id()).await.unwrap();

        assert!(matches!(
            service.validate(key.secret()).await,
            Err(DomainError::InvalidKey)
        ));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_not_found() {
        let service = create_service();
        let alice = Account::new("alice@example.com", "Alice");
        let bob = Account::new("bob@example.com", "Bob");
        let key = service.create(&alice, create_request("keep")).await.unwrap();

        assert!(matches!(
            service.delete(bob.id(), key.id()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(service.validate(key.secret()).await.is_ok());
    }
}
