//! Account repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Account, AccountId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for account storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync + Debug {
    /// Get an account by its ID
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Get an account by email (the identity provider's key)
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    /// Create a new account. Fails with a conflict if the email is taken.
    async fn create(&self, account: Account) -> Result<Account, DomainError>;
}
