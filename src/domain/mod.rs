//! Domain layer - Core business logic and entities

pub mod account;
pub mod api_key;
pub mod error;
pub mod summary;

pub use account::{Account, AccountId, AccountRepository, PlanTier, QuotaPolicy};
pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyValidationError};
pub use error::DomainError;
pub use summary::{
    LicenseInfo, ReadmeSummarizer, ReadmeSummary, RepositoryData, RepositoryFetcher,
    RepositoryMetadata, RepositoryRef, RepositorySummary,
};
