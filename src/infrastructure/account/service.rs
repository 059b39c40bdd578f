//! Account service
//!
//! Resolves signed-in profiles to accounts, creating them on first sign-in.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::account::{Account, AccountRepository};
use crate::domain::DomainError;

/// Profile handed over by the external identity provider
#[derive(Debug, Clone, Default)]
pub struct SignInProfile {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Account service
#[derive(Debug)]
pub struct AccountService<R>
where
    R: AccountRepository,
{
    repository: Arc<R>,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Find the account for a profile email, creating it if this is the
    /// first sign-in.
    pub async fn sign_in(&self, profile: SignInProfile) -> Result<Account, DomainError> {
        let email = normalize_email(&profile.email)?;

        if let Some(account) = self.repository.get_by_email(&email).await? {
            debug!(account_id = %account.id(), "Existing account signed in");
            return Ok(account);
        }

        let mut account = Account::from_profile(&email, profile.name.as_deref());

        if let Some(image) = profile.image.filter(|i| !i.trim().is_empty()) {
            account = account.with_image(image);
        }

        match self.repository.create(account).await {
            Ok(created) => {
                info!("Account created on first sign-in: id={}", created.id());
                Ok(created)
            }
            // A concurrent sign-in for the same email won the insert
            Err(DomainError::Conflict { .. }) => self
                .repository
                .get_by_email(&email)
                .await?
                .ok_or_else(|| DomainError::internal("Account vanished after conflict")),
            Err(e) => Err(e),
        }
    }

    /// Resolve a session email to its account
    pub async fn get_by_email(&self, email: &str) -> Result<Account, DomainError> {
        let email = normalize_email(email)?;

        self.repository
            .get_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }
}

/// Trim and lowercase an email, rejecting obviously malformed ones
fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("A valid email is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{MockAccountRepository, PlanTier};
    use crate::infrastructure::account::InMemoryAccountRepository;

    fn create_service() -> AccountService<InMemoryAccountRepository> {
        AccountService::new(Arc::new(InMemoryAccountRepository::new()))
    }

    fn profile(email: &str, name: Option<&str>) -> SignInProfile {
        SignInProfile {
            email: email.to_string(),
            name: name.map(str::to_string),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_account() {
        let service = create_service();

        let account = service
            .sign_in(profile("grace@example.com", None))
            .await
            .unwrap();

        assert_eq!(account.email(), "grace@example.com");
        assert_eq!(account.name(), "grace");
        assert_eq!(account.plan(), PlanTier::Development);
    }

    #[tokio::test]
    async fn test_repeat_sign_in_returns_same_account() {
        let service = create_service();

        let first = service
            .sign_in(profile("Grace@Example.com", Some("Grace")))
            .await
            .unwrap();
        let second = service
            .sign_in(profile("grace@example.com", Some("Someone Else")))
            .await
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(second.name(), "Grace");
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_email() {
        let service = create_service();

        for email in ["", "no-at-sign", "@example.com", "user@"] {
            let result = service.sign_in(profile(email, None)).await;
            assert!(matches!(result, Err(DomainError::Validation { .. })), "{}", email);
        }
    }

    #[tokio::test]
    async fn test_get_by_email_missing() {
        let service = create_service();

        match service.get_by_email("nobody@example.com").await {
            Err(DomainError::NotFound { message }) => assert_eq!(message, "User not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_in_recovers_from_concurrent_create() {
        let existing = Account::new("race@example.com", "race");
        let existing_id = *existing.id();

        let mut repository = MockAccountRepository::new();
        let mut lookups = 0;
        repository.expect_get_by_email().returning(move |_| {
            lookups += 1;
            if lookups == 1 {
                Ok(None)
            } else {
                Ok(Some(existing.clone()))
            }
        });
        repository
            .expect_create()
            .returning(|_| Err(DomainError::conflict("duplicate")));

        let service = AccountService::new(Arc::new(repository));
        let account = service
            .sign_in(profile("race@example.com", None))
            .await
            .unwrap();

        assert_eq!(*account.id(), existing_id);
    }
}
