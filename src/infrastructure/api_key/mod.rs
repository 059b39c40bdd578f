//! API Key infrastructure implementations
//!
//! Key generation, storage, the validation gate, the quota limiter, and the
//! key management service.

mod gate;
mod generator;
mod postgres_repository;
mod quota_limiter;
mod repository;
mod service;

pub use gate::{ValidatedKey, ValidationGate};
pub use generator::{ApiKeyGenerator, DEFAULT_KEY_BYTES, DEFAULT_KEY_PREFIX};
pub use postgres_repository::PostgresApiKeyRepository;
pub use quota_limiter::{Admission, AdmissionDecision, DenialReason, QuotaLimiter};
pub use repository::InMemoryApiKeyRepository;
pub use service::{ApiKeyService, CreateApiKeyRequest, UpdateApiKeyRequest, KEY_NOT_FOUND};
