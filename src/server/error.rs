//! Error kinds returned by handlers and their JSON envelope.
//!
//! Every failing route answers with `{"success": false, "error": <status>, "message": ...}`.
//! The cause carried by a variant is logged, never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Empty result, unknown row or unknown route (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Well-formed body with the wrong shape (422)
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    /// Rejected write, or a method the route does not serve (405)
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Unexpected database failure (500)
    #[error("database error: {0}")]
    Internal(#[source] DbError),
}

pub type ApiResponse<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "resource not found",
            Self::BadRequest(_) => "Bad Request",
            Self::Unprocessable(_) => "unprocessable",
            Self::MethodNotAllowed(_) => "Method Not Allowed",
            Self::Internal(_) => "Internal Server Error",
        }
    }

    /// Writes are reported as 405 whatever went wrong underneath.
    pub fn rejected_write(err: impl std::fmt::Display) -> Self {
        Self::MethodNotAllowed(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => Self::NotFound(e.to_string()),
            _ => Self::Internal(e),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::from(DbError::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) => tracing::error!("Database error: {e}"),
            other => tracing::info!(status = status.as_u16(), "{other}"),
        }

        let body = json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn envelope(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = envelope(ApiError::NotFound("question 3".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"success": false, "error": 404, "message": "resource not found"})
        );
    }

    #[tokio::test]
    async fn every_kind_has_matching_code_in_body() {
        let cases = [
            (ApiError::BadRequest("x".into()), 400, "Bad Request"),
            (ApiError::Unprocessable("x".into()), 422, "unprocessable"),
            (ApiError::MethodNotAllowed("x".into()), 405, "Method Not Allowed"),
            (
                ApiError::Internal(DbError::Sqlx(sqlx::Error::PoolTimedOut)),
                500,
                "Internal Server Error",
            ),
        ];
        for (err, code, message) in cases {
            let (status, body) = envelope(err).await;
            assert_eq!(status.as_u16(), code);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], code);
            assert_eq!(body["message"], message);
        }
    }

    #[test]
    fn db_not_found_maps_to_404_and_other_failures_to_500() {
        let err = ApiError::from(DbError::NotFound {
            resource: "category",
            id: 8,
        });
        assert!(matches!(err, ApiError::NotFound(ref cause) if cause == "category 8 not found"));

        let err = ApiError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejected_write_keeps_cause() {
        let err = ApiError::rejected_write(DbError::NotFound {
            resource: "question",
            id: 97,
        });
        assert!(matches!(err, ApiError::MethodNotAllowed(ref cause) if cause == "question 97 not found"));
    }
}
