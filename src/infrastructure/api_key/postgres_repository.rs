//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::account::{AccountId, PlanTier};
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::{count_from_db, count_to_db};

/// Single-statement check-and-increment. The row lock taken by UPDATE
/// serializes concurrent callers, and each re-evaluates the predicate.
const INCREMENT_USAGE_IF_BELOW_LIMIT: &str = r#"
    UPDATE api_keys
    SET usage = usage + 1
    WHERE id = $1 AND (monthly_limit IS NULL OR usage < monthly_limit)
    RETURNING usage
"#;

/// PostgreSQL implementation of ApiKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, secret, owner_id, key_type, usage, monthly_limit, created_at
            FROM api_keys
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn get_by_secret(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, secret, owner_id, key_type, usage, monthly_limit, created_at
            FROM api_keys
            WHERE secret = $1
            "#,
        )
        .bind(secret)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn list_by_owner(&self, owner: &AccountId) -> Result<Vec<ApiKey>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, secret, owner_id, key_type, usage, monthly_limit, created_at
            FROM api_keys
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let monthly_limit = api_key.monthly_limit().map(count_to_db).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, secret, owner_id, key_type, usage,
                                  monthly_limit, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(api_key.id().as_uuid())
        .bind(api_key.name())
        .bind(api_key.secret())
        .bind(api_key.owner().map(|o| *o.as_uuid()))
        .bind(api_key.key_type().as_str())
        .bind(count_to_db(api_key.usage())?)
        .bind(monthly_limit)
        .bind(api_key.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!(
                    "API key with ID '{}' or the same secret already exists",
                    api_key.id()
                ))
            } else {
                DomainError::storage(format!("Failed to create API key: {}", e))
            }
        })?;

        Ok(api_key)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        let monthly_limit = api_key.monthly_limit().map(count_to_db).transpose()?;

        let row = sqlx::query(
            r#"
            UPDATE api_keys
            SET name = $2, monthly_limit = $3
            WHERE id = $1
            RETURNING id, name, secret, owner_id, key_type, usage, monthly_limit, created_at
            "#,
        )
        .bind(api_key.id().as_uuid())
        .bind(api_key.name())
        .bind(monthly_limit)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update API key: {}", e)))?;

        match row {
            Some(row) => row_to_api_key(&row),
            None => Err(DomainError::not_found(format!(
                "API key '{}' not found",
                api_key.id()
            ))),
        }
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_usage_if_below_limit(
        &self,
        id: &ApiKeyId,
    ) -> Result<Option<u64>, DomainError> {
        let usage: Option<i64> = sqlx::query_scalar(INCREMENT_USAGE_IF_BELOW_LIMIT)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to increment API key usage: {}", e))
            })?;

        usage.map(count_from_db).transpose()
    }
}

fn column_error(column: &str, e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Failed to read column '{}': {}", column, e))
}

fn row_to_api_key(row: &PgRow) -> Result<ApiKey, DomainError> {
    let id: Uuid = row.try_get("id").map_err(|e| column_error("id", e))?;
    let name: String = row.try_get("name").map_err(|e| column_error("name", e))?;
    let secret: String = row.try_get("secret").map_err(|e| column_error("secret", e))?;
    let owner_id: Option<Uuid> = row
        .try_get("owner_id")
        .map_err(|e| column_error("owner_id", e))?;
    let key_type: String = row
        .try_get("key_type")
        .map_err(|e| column_error("key_type", e))?;
    let usage: i64 = row.try_get("usage").map_err(|e| column_error("usage", e))?;
    let monthly_limit: Option<i64> = row
        .try_get("monthly_limit")
        .map_err(|e| column_error("monthly_limit", e))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| column_error("created_at", e))?;

    let key_type: PlanTier = key_type
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid key type in database: {}", e)))?;

    // NULL owners only appear on legacy rows
    let api_key = match owner_id {
        Some(owner) => ApiKey::new(name, secret, AccountId::from_uuid(owner)),
        None => ApiKey::legacy(name, secret),
    };

    Ok(api_key
        .with_id(ApiKeyId::from_uuid(id))
        .with_type(key_type)
        .with_usage(count_from_db(usage)?)
        .with_monthly_limit(monthly_limit.map(count_from_db).transpose()?)
        .with_created_at(created_at))
}
