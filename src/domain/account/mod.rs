//! Account domain
//!
//! Accounts are the end-user identities that own API keys. They are resolved
//! from an external sign-in profile email and created lazily on first sign-in.

mod entity;
mod plan;
mod repository;

pub use entity::{Account, AccountId};
pub use plan::{PlanTier, QuotaPolicy};
pub use repository::AccountRepository;

#[cfg(test)]
pub use repository::MockAccountRepository;
