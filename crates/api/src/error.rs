use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use portfolio_site_core::assets::AssetError;
use portfolio_site_core::SyncError;
use serde_json::json;

/// API error type rendered as a JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotAuthenticated => ApiError::Unauthorized,
            SyncError::PermissionDenied(err) => ApiError::Forbidden(err.to_string()),
            SyncError::InvalidSection(msg) => ApiError::BadRequest(msg),
            SyncError::Malformed(err) => ApiError::BadRequest(err.to_string()),
            err @ (SyncError::Store(_) | SyncError::Identity(_)) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            AssetError::UnsupportedMediaType => ApiError::BadRequest(err.to_string()),
            AssetError::Unmeasurable(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "notFound",
            ApiError::BadRequest(_) => "badRequest",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::PayloadTooLarge(_) => "payloadTooLarge",
            ApiError::Internal(_) | ApiError::Database(_) => "internalError",
        }
    }

    /// Client-facing message. Server-side detail is logged, not returned.
    fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::PayloadTooLarge(msg) => msg.clone(),
            ApiError::Unauthorized => "Authentication required".to_string(),
            ApiError::Internal(_) | ApiError::Database(_) => {
                tracing::error!(error = %self, "request failed");
                "An internal error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "type": self.error_type(),
                "message": self.public_message(),
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use portfolio_site_core::store::StoreError;

    use super::*;

    fn status(err: SyncError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn sync_errors_map_to_status_codes() {
        assert_eq!(status(SyncError::NotAuthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status(SyncError::InvalidSection("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(SyncError::from(StoreError::Unavailable {
                message: "offline".into(),
                retryable: true
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn asset_errors_map_to_status_codes() {
        let too_large = AssetError::PayloadTooLarge {
            size: 2048,
            limit: 1024,
        };
        let response = ApiError::from(too_large).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let unsupported = ApiError::from(AssetError::UnsupportedMediaType).into_response();
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let err = ApiError::from(SyncError::from(StoreError::Unavailable {
            message: "connection refused at 10.0.0.3".into(),
            retryable: false,
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["type"], "internalError");
        assert_eq!(body["error"]["statusCode"], 500);
        assert!(!body.to_string().contains("10.0.0.3"));
    }
}
