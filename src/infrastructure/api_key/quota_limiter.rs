//! Quota limiter
//!
//! Admission control in front of the protected endpoints. Each admitted call
//! consumes one unit of the key's monthly allowance through a single
//! conditional increment in the store, so concurrent callers cannot overdraw.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::account::AccountId;
use crate::domain::api_key::{ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

use super::gate::ValidationGate;

/// A granted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub key_id: ApiKeyId,
    pub owner: Option<AccountId>,
    /// Usage after this call was counted
    pub usage: u64,
    pub monthly_limit: Option<u64>,
}

impl Admission {
    /// Calls left this month, or None when unlimited
    pub fn remaining(&self) -> Option<u64> {
        self.monthly_limit
            .map(|limit| limit.saturating_sub(self.usage))
    }
}

/// Why a call was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    InvalidKey,
    QuotaExceeded { usage: u64, limit: u64 },
}

impl From<DenialReason> for DomainError {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::InvalidKey => DomainError::InvalidKey,
            DenialReason::QuotaExceeded { usage, limit } => {
                DomainError::QuotaExceeded { usage, limit }
            }
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Granted(Admission),
    Denied(DenialReason),
}

impl AdmissionDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// Convert a denial into the matching domain error
    pub fn into_result(self) -> Result<Admission, DomainError> {
        match self {
            Self::Granted(admission) => Ok(admission),
            Self::Denied(reason) => Err(reason.into()),
        }
    }
}

/// Validates a secret and consumes quota for it
#[derive(Debug)]
pub struct QuotaLimiter<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    gate: ValidationGate<R>,
}

impl<R: ApiKeyRepository> QuotaLimiter<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            gate: ValidationGate::new(Arc::clone(&repository)),
            repository,
        }
    }

    /// Validate the secret, then count one call against its monthly limit.
    ///
    /// Store failures are returned as errors and never grant access.
    pub async fn check_and_consume(&self, secret: &str) -> Result<AdmissionDecision, DomainError> {
        let Some(key) = self.gate.resolve(secret).await? else {
            debug!("Admission denied: invalid key");
            return Ok(AdmissionDecision::Denied(DenialReason::InvalidKey));
        };

        if let Some(limit) = key.monthly_limit() {
            if key.usage() >= limit {
                warn!(key_id = %key.id(), usage = key.usage(), limit, "Admission denied: quota exceeded");
                return Ok(AdmissionDecision::Denied(DenialReason::QuotaExceeded {
                    usage: key.usage(),
                    limit,
                }));
            }
        }

        let incremented = self
            .repository
            .increment_usage_if_below_limit(key.id())
            .await
            .map_err(|e| {
                error!(key_id = %key.id(), error = %e, "Failed to record API key usage, denying call");
                e
            })?;

        match incremented {
            Some(usage) => {
                debug!(key_id = %key.id(), usage, "Admission granted");
                Ok(AdmissionDecision::Granted(Admission {
                    key_id: *key.id(),
                    owner: key.owner().copied(),
                    usage,
                    monthly_limit: key.monthly_limit(),
                }))
            }
            None => self.explain_rejected_increment(key.id()).await,
        }
    }

    /// The store refused the increment after the key was read. Either another
    /// caller used the last unit or the key was deleted in between.
    async fn explain_rejected_increment(
        &self,
        id: &ApiKeyId,
    ) -> Result<AdmissionDecision, DomainError> {
        let Some(current) = self.repository.get(id).await? else {
            debug!(key_id = %id, "Admission denied: key deleted during check");
            return Ok(AdmissionDecision::Denied(DenialReason::InvalidKey));
        };

        match current.monthly_limit() {
            Some(limit) => {
                warn!(key_id = %id, usage = current.usage(), limit, "Admission denied: quota exceeded");
                Ok(AdmissionDecision::Denied(DenialReason::QuotaExceeded {
                    usage: current.usage(),
                    limit,
                }))
            }
            None => {
                error!(key_id = %id, "Usage increment rejected for a key without a limit");
                Err(DomainError::internal(format!(
                    "Usage increment rejected for API key '{}'",
                    id
                )))
            }
        }
    }
}
