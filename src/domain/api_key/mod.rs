//! API Key domain
//!
//! Domain types and the storage contract for API keys: their secrets,
//! ownership, usage counters and optional monthly quotas.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKey, ApiKeyId};
pub use repository::ApiKeyRepository;
pub use validation::{
    validate_key_name, validate_monthly_limit, ApiKeyValidationError, MAX_KEY_NAME_LENGTH,
};

#[cfg(test)]
pub use repository::MockApiKeyRepository;
