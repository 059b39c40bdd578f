//! API key management and validation endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::api::middleware::{ApiKeyHeader, RequireAccount};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::account::PlanTier;
use crate::domain::api_key::{validate_monthly_limit, ApiKey, ApiKeyId};
use crate::infrastructure::api_key::{self, KEY_NOT_FOUND};

pub fn create_keys_router() -> Router<AppState> {
    Router::new()
        .route("/keys", get(list_api_keys).post(create_api_key))
        .route(
            "/keys/{id}",
            get(get_api_key).patch(update_api_key).delete(delete_api_key),
        )
        .route("/validate-key", post(validate_api_key))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "monthlyLimit")]
    pub monthly_limit: Option<i64>,
    #[serde(default, rename = "type")]
    pub key_type: Option<PlanTier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApiKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Absent leaves the limit alone, `null` clears it
    #[serde(default, rename = "monthlyLimit", deserialize_with = "double_option")]
    pub monthly_limit: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateKeyRequest {
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
}

/// Key record as returned to its owner. The secret is included; masking is
/// left to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub key_type: PlanTier,
    pub usage: u64,
    pub monthly_limit: Option<u64>,
    pub user_id: Option<String>,
    pub created_at: String,
}

impl From<&ApiKey> for ApiKeyResponse {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id().to_string(),
            name: key.name().to_string(),
            key: key.secret().to_string(),
            key_type: key.key_type(),
            usage: key.usage(),
            monthly_limit: key.monthly_limit(),
            user_id: key.owner().map(|owner| owner.to_string()),
            created_at: key.created_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Distinguish an absent field from an explicit `null`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Malformed ids cannot name an owned key
fn parse_key_id(id: &str) -> Result<ApiKeyId, ApiError> {
    id.parse::<ApiKeyId>()
        .map_err(|_| ApiError::not_found(KEY_NOT_FOUND))
}

fn parse_limit(limit: Option<i64>) -> Result<Option<u64>, ApiError> {
    limit
        .map(validate_monthly_limit)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()).with_param("monthlyLimit"))
}

/// GET /api/keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<Vec<ApiKeyResponse>>, ApiError> {
    let keys = state.api_key_service.list(account.id()).await?;

    Ok(Json(keys.iter().map(ApiKeyResponse::from).collect()))
}

/// POST /api/keys
pub async fn create_api_key(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyResponse>), ApiError> {
    let monthly_limit = parse_limit(request.monthly_limit)?;

    let key = state
        .api_key_service
        .create(
            &account,
            api_key::CreateApiKeyRequest {
                name: request.name.unwrap_or_default(),
                monthly_limit,
                key_type: request.key_type,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiKeyResponse::from(&key))))
}

/// GET /api/keys/{id}
pub async fn get_api_key(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Path(id): Path<String>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = parse_key_id(&id)?;
    let key = state.api_key_service.get(account.id(), &id).await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// PATCH /api/keys/{id}
pub async fn update_api_key(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Path(id): Path<String>,
    Json(request): Json<UpdateApiKeyRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let monthly_limit = request.monthly_limit.map(parse_limit).transpose()?;
    let id = parse_key_id(&id)?;

    let key = state
        .api_key_service
        .update(
            account.id(),
            &id,
            api_key::UpdateApiKeyRequest {
                name: request.name.unwrap_or_default(),
                monthly_limit,
            },
        )
        .await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// DELETE /api/keys/{id}
pub async fn delete_api_key(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_key_id(&id)?;
    state.api_key_service.delete(account.id(), &id).await?;

    Ok(SuccessResponse::ok())
}

/// POST /api/validate-key
///
/// Accepts the key from `X-API-Key` or a JSON body `{"apiKey": "..."}`.
pub async fn validate_api_key(
    State(state): State<AppState>,
    ApiKeyHeader(header_key): ApiKeyHeader,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let secret = match header_key {
        Some(secret) => Some(secret),
        None if body.is_empty() => None,
        None => {
            let request: ValidateKeyRequest = serde_json::from_slice(&body)
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON data: {}", e)))?;
            request.api_key.filter(|k| !k.trim().is_empty())
        }
    };

    let secret = secret.ok_or_else(|| ApiError::bad_request("API key is required"))?;

    let validated = state.api_key_service.validate(&secret).await?;
    debug!(key_id = %validated.key_id, "API key validated");

    Ok(SuccessResponse::ok())
}
