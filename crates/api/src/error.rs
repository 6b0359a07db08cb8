//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use canebooks_shared::AppError;

/// Wrapper turning [`AppError`] into the uniform JSON error response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E: Into<AppError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({
                "error": self.0.error_code().to_ascii_lowercase(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let response = ApiError(AppError::Forbidden("scope".into())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ApiError(AppError::Conflict("not ready".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ApiError(AppError::Gone("evicted".into())).into_response();
        assert_eq!(response.status(), StatusCode::GONE);

        let response = ApiError(AppError::UnsupportedMedia("xls".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = ApiError(AppError::Validation("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
