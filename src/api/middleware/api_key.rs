//! API key extraction

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::api::types::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Secret presented by the caller, if any.
///
/// Read from `X-API-Key`, falling back to `Authorization: Bearer <key>`.
/// Whether a missing key is an error is up to the handler.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyHeader(pub Option<String>);

impl<S> FromRequestParts<S> for ApiKeyHeader
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_api_key_from_headers(&parts.headers).map(ApiKeyHeader)
    }
}

pub fn extract_api_key_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    if let Some(api_key_header) = headers.get(API_KEY_HEADER) {
        let key = api_key_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?
            .trim();

        if !key.is_empty() {
            return Ok(Some(key.to_string()));
        }
    }

    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(Some(token.to_string()));
            }
        }
    }

    Ok(None)
}
