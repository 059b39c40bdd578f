//! Session endpoints
//!
//! Credentials are checked by an external identity provider. Its trusted
//! front end reports the signed-in profile here and receives a session token.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::middleware::RequireAccount;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::account::{Account, PlanTier};
use crate::infrastructure::account::SignInProfile;

pub const IDENTITY_SECRET_HEADER: &str = "x-identity-secret";

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(sign_in))
        .route("/me", get(get_current_account))
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub account: AccountResponse,
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub plan: PlanTier,
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            email: account.email().to_string(),
            name: account.name().to_string(),
            image: account.image().map(String::from),
            plan: account.plan(),
            created_at: account.created_at().to_rfc3339(),
        }
    }
}

/// Compare without short-circuiting on the first differing byte
fn secrets_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn check_identity_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.identity_secret.as_deref() else {
        warn!("Sign-in attempted but no identity secret is configured");
        return Err(ApiError::unauthorized("Sign-in is not enabled"));
    };

    let provided = headers
        .get(IDENTITY_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secrets_match(expected, provided) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid identity secret"))
    }
}

/// POST /auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    check_identity_secret(&state, &headers)?;

    let account = state
        .account_service
        .sign_in(SignInProfile {
            email: request.email,
            name: request.name,
            image: request.image,
        })
        .await?;

    let (token, claims) = state.jwt_service.generate(&account)?;

    Ok(Json(SignInResponse {
        token,
        account: AccountResponse::from(&account),
        expires_at: claims.expires_at().map(|t| t.to_rfc3339()),
    }))
}

/// GET /auth/me
pub async fn get_current_account(
    RequireAccount(account): RequireAccount,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(AccountResponse::from(&account)))
}
