//! Repository summarizer endpoint

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::api::middleware::ApiKeyHeader;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::RepositorySummary;

/// Remaining monthly calls after this one, omitted for unlimited keys
pub const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";

pub fn create_summarizer_router() -> Router<AppState> {
    Router::new().route("/github-summarizer", post(summarize_repository))
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default, rename = "githubUrl")]
    pub github_url: Option<String>,
}

/// POST /api/github-summarizer
pub async fn summarize_repository(
    State(state): State<AppState>,
    ApiKeyHeader(secret): ApiKeyHeader,
    Json(request): Json<SummarizeRequest>,
) -> Result<(HeaderMap, Json<RepositorySummary>), ApiError> {
    let secret = secret.unwrap_or_default();
    let github_url = request.github_url.unwrap_or_default();

    let summarized = state
        .summarizer_service
        .handle(&secret, &github_url)
        .await?;

    let mut headers = HeaderMap::new();
    if let Some(remaining) = summarized.admission.remaining() {
        headers.insert(QUOTA_REMAINING_HEADER, HeaderValue::from(remaining));
    }

    Ok((headers, Json(summarized.summary)))
}
