//! Conversion of errors into JSON error responses.

use crate::KeywardenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason.
    pub error: String,
}

impl KeywardenError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            KeywardenError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KeywardenError::NotFound => StatusCode::NOT_FOUND,
            KeywardenError::Expired | KeywardenError::HwidMismatch => StatusCode::FORBIDDEN,
            KeywardenError::ConfigError(_)
            | KeywardenError::StoreIO(_)
            | KeywardenError::CorruptRecord(_)
            | KeywardenError::NotifierTransport(_)
            | KeywardenError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for KeywardenError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = if self.is_internal() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            KeywardenError::InvalidRequest("Key is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(KeywardenError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(KeywardenError::Expired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(KeywardenError::HwidMismatch.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            KeywardenError::CorruptRecord("eof".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = KeywardenError::StoreIO("/var/lib/keys: permission denied".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.error, "Internal server error");
    }

    #[tokio::test]
    async fn test_rejection_message_is_shown() {
        let response = KeywardenError::HwidMismatch.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "HWID mismatch");
    }
}
