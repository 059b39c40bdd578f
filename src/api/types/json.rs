//! JSON body extractor reporting failures in the API error envelope

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::{ApiError, ApiErrorType};

/// `axum::Json` whose rejections are `ApiError`s. Every body problem is a
/// 400 except a missing content type, which is a 415.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumJson::<T>::from_request(req, state)
            .await
            .map(|AxumJson(value)| Json(value))
            .map_err(body_error)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

fn body_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            ApiError::bad_request(format!("Invalid request body: {}", err.body_text()))
                .with_code("invalid_body")
        }
        JsonRejection::JsonSyntaxError(_) => {
            ApiError::bad_request("Request body is not valid JSON").with_code("invalid_json")
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiErrorType::InvalidRequestError,
            "Expected 'Content-Type: application/json'",
        )
        .with_code("unsupported_media_type"),
        other => {
            ApiError::bad_request(format!("Failed to read request body: {}", other.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[derive(Debug, serde::Deserialize)]
    struct SummarizeBody {
        #[serde(rename = "githubUrl")]
        github_url: String,
    }

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = Request::builder().method("POST");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let req = request(
            Some("application/json"),
            r#"{"githubUrl": "https://github.com/tokio-rs/axum"}"#,
        );

        let Json(body) = Json::<SummarizeBody>::from_request(req, &()).await.unwrap();
        assert_eq!(body.github_url, "https://github.com/tokio-rs/axum");
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let req = request(Some("application/json"), "{not json");

        let err = Json::<SummarizeBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.code.as_deref(), Some("invalid_json"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_bad_request() {
        let req = request(Some("application/json"), r#"{"githubUrl": 42}"#);

        let err = Json::<SummarizeBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let req = request(None, r#"{"githubUrl": "x"}"#);

        let err = Json::<SummarizeBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
