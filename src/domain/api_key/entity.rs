//! API Key entity and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::{AccountId, PlanTier};
use crate::domain::DomainError;

/// API Key identifier, assigned by the store on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(Uuid);

impl ApiKeyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ApiKeyId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DomainError::validation(format!("Invalid API key ID: '{}'", s)))
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// API Key entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    id: ApiKeyId,
    /// Display name, not unique
    name: String,
    /// Full secret presented by callers. Globally unique.
    secret: String,
    /// Owning account. Only absent on legacy rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<AccountId>,
    #[serde(rename = "type")]
    key_type: PlanTier,
    usage: u64,
    /// Monthly ceiling on usage (None = unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly_limit: Option<u64>,
    created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Create a new API key with zero usage and no limit
    pub fn new(name: impl Into<String>, secret: impl Into<String>, owner: AccountId) -> Self {
        Self {
            id: ApiKeyId::generate(),
            name: name.into(),
            secret: secret.into(),
            owner: Some(owner),
            key_type: PlanTier::default(),
            usage: 0,
            monthly_limit: None,
            created_at: Utc::now(),
        }
    }

    /// A key stored before ownership was recorded
    pub fn legacy(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            owner: None,
            ..Self::new(name, secret, AccountId::generate())
        }
    }

    pub fn with_id(mut self, id: ApiKeyId) -> Self {
        self.id = id;
        self
    }

    pub fn with_type(mut self, key_type: PlanTier) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn with_monthly_limit(mut self, monthly_limit: Option<u64>) -> Self {
        self.monthly_limit = monthly_limit;
        self
    }

    pub fn with_usage(mut self, usage: u64) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn owner(&self) -> Option<&AccountId> {
        self.owner.as_ref()
    }

    pub fn key_type(&self) -> PlanTier {
        self.key_type
    }

    pub fn usage(&self) -> u64 {
        self.usage
    }

    pub fn monthly_limit(&self) -> Option<u64> {
        self.monthly_limit
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Quota and ownership checks

    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        self.owner.as_ref() == Some(account)
    }

    /// Whether one more call fits under the monthly limit
    pub fn has_quota(&self) -> bool {
        match self.monthly_limit {
            Some(limit) => self.usage < limit,
            None => true,
        }
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_monthly_limit(&mut self, monthly_limit: Option<u64>) {
        self.monthly_limit = monthly_limit;
    }

    /// Consume one call if quota allows, returning the new usage
    pub fn try_consume(&mut self) -> Option<u64> {
        if !self.has_quota() {
            return None;
        }

        self.usage = self.usage.saturating_add(1);
        Some(self.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_api_key(name: &str) -> ApiKey {
        ApiKey::new(name, "rsg_abcdefghijklmnop", AccountId::generate())
    }

    #[test]
    fn test_api_key_creation() {
        let owner = AccountId::generate();
        let key = ApiKey::new("ci-key", "rsg_secret", owner);

        assert_eq!(key.name(), "ci-key");
        assert_eq!(key.secret(), "rsg_secret");
        assert_eq!(key.usage(), 0);
        assert_eq!(key.monthly_limit(), None);
        assert_eq!(key.key_type(), PlanTier::Development);
        assert!(key.is_owned_by(&owner));
        assert!(!key.is_owned_by(&AccountId::generate()));
    }

    #[test]
    fn test_api_key_id_parse() {
        let id = ApiKeyId::generate();
        let parsed: ApiKeyId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        assert!("42".parse::<ApiKeyId>().is_err());
    }

    #[test]
    fn test_try_consume_respects_limit() {
        let mut key = create_test_api_key("limited").with_monthly_limit(Some(2));

        assert_eq!(key.try_consume(), Some(1));
        assert_eq!(key.try_consume(), Some(2));
        assert_eq!(key.try_consume(), None);
        assert_eq!(key.usage(), 2);
    }

    #[test]
    fn test_try_consume_unlimited() {
        let mut key = create_test_api_key("unlimited");

        for expected in 1..=100 {
            assert_eq!(key.try_consume(), Some(expected));
        }
    }

    #[test]
    fn test_zero_limit_denies_immediately() {
        let mut key = create_test_api_key("frozen").with_monthly_limit(Some(0));
        assert!(!key.has_quota());
        assert_eq!(key.try_consume(), None);
    }

    #[test]
    fn test_legacy_key_has_no_owner() {
        let key = ApiKey::legacy("legacy", "rsg_legacy");
        assert!(key.owner().is_none());
        assert!(!key.is_owned_by(&AccountId::generate()));
    }

    #[test]
    fn test_serialization_renames_type() {
        let key = create_test_api_key("serialized").with_type(PlanTier::Production);
        let json = serde_json::to_value(&key).unwrap();

        assert_eq!(json["type"], "production");
        assert_eq!(json["usage"], 0);
        assert!(json.get("monthly_limit").is_none());
    }
}
