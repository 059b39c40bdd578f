//! PostgreSQL account repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::account::{Account, AccountId, AccountRepository, PlanTier};
use crate::domain::DomainError;

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, image, plan, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, image, plan, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get account by email: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn create(&self, account: Account) -> Result<Account, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, name, image, plan, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id().as_uuid())
        .bind(account.email())
        .bind(account.name())
        .bind(account.image())
        .bind(account.plan().as_str())
        .bind(account.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!(
                    "Account with email '{}' already exists",
                    account.email()
                ))
            } else {
                DomainError::storage(format!("Failed to create account: {}", e))
            }
        })?;

        Ok(account)
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, DomainError> {
    let read = |column: &str, e: sqlx::Error| {
        DomainError::storage(format!("Failed to read column '{}': {}", column, e))
    };

    let id: Uuid = row.try_get("id").map_err(|e| read("id", e))?;
    let email: String = row.try_get("email").map_err(|e| read("email", e))?;
    let name: String = row.try_get("name").map_err(|e| read("name", e))?;
    let image: Option<String> = row.try_get("image").map_err(|e| read("image", e))?;
    let plan: String = row.try_get("plan").map_err(|e| read("plan", e))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| read("created_at", e))?;

    let plan: PlanTier = plan
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid plan in database: {}", e)))?;

    let mut account = Account::new(email, name)
        .with_id(AccountId::from_uuid(id))
        .with_plan(plan)
        .with_created_at(created_at);

    if let Some(image) = image {
        account = account.with_image(image);
    }

    Ok(account)
}
