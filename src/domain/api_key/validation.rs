//! API Key validation utilities

use thiserror::Error;

use crate::domain::DomainError;

/// Maximum length for API key display names
pub const MAX_KEY_NAME_LENGTH: usize = 100;

/// Errors that can occur while validating key input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("Name is required")]
    EmptyName,

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Monthly limit must be a non-negative integer, got {0}")]
    NegativeLimit(i64),
}

impl From<ApiKeyValidationError> for DomainError {
    fn from(err: ApiKeyValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Validate a key display name, returning it trimmed
pub fn validate_key_name(name: &str) -> Result<String, ApiKeyValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ApiKeyValidationError::EmptyName);
    }

    if trimmed.chars().count() > MAX_KEY_NAME_LENGTH {
        return Err(ApiKeyValidationError::NameTooLong(MAX_KEY_NAME_LENGTH));
    }

    Ok(trimmed.to_string())
}

/// Validate a monthly limit as received over the wire
pub fn validate_monthly_limit(limit: i64) -> Result<u64, ApiKeyValidationError> {
    u64::try_from(limit).map_err(|_| ApiKeyValidationError::NegativeLimit(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(validate_key_name("ci-key").unwrap(), "ci-key");
        assert_eq!(validate_key_name("  padded  ").unwrap(), "padded");
        assert_eq!(validate_key_name("Production key #2").unwrap(), "Production key #2");
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(validate_key_name(""), Err(ApiKeyValidationError::EmptyName));
        assert_eq!(validate_key_name("   "), Err(ApiKeyValidationError::EmptyName));
    }

    #[test]
    fn test_name_too_long() {
        let long_name = "a".repeat(MAX_KEY_NAME_LENGTH + 1);
        assert_eq!(
            validate_key_name(&long_name),
            Err(ApiKeyValidationError::NameTooLong(MAX_KEY_NAME_LENGTH))
        );

        let max_name = "a".repeat(MAX_KEY_NAME_LENGTH);
        assert!(validate_key_name(&max_name).is_ok());
    }

    #[test]
    fn test_monthly_limit() {
        assert_eq!(validate_monthly_limit(0), Ok(0));
        assert_eq!(validate_monthly_limit(1000), Ok(1000));
        assert_eq!(
            validate_monthly_limit(-1),
            Err(ApiKeyValidationError::NegativeLimit(-1))
        );
    }

    #[test]
    fn test_into_domain_error() {
        let err: DomainError = ApiKeyValidationError::EmptyName.into();
        assert_eq!(err.to_string(), "Validation error: Name is required");
    }
}
