//! Plan tiers and the default quota each one grants

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Plan tier of an account or key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Development,
    Production,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for PlanTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(DomainError::validation(format!(
                "Unknown plan tier '{}'. Expected 'development' or 'production'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default monthly allowance per plan tier. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaPolicy {
    development: Option<u64>,
    production: Option<u64>,
}

impl QuotaPolicy {
    pub fn new(development: Option<u64>, production: Option<u64>) -> Self {
        Self {
            development,
            production,
        }
    }

    /// A policy that grants no default limit to any tier
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn default_allowance(&self, tier: PlanTier) -> Option<u64> {
        match tier {
            PlanTier::Development => self.development,
            PlanTier::Production => self.production,
        }
    }

    /// An explicit limit always wins over the tier default.
    pub fn resolve(&self, tier: PlanTier, explicit: Option<u64>) -> Option<u64> {
        explicit.or_else(|| self.default_allowance(tier))
    }
}
