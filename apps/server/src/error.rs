//! # API Error Mapping
//!
//! Translates engine errors into HTTP responses.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation / bad payment / bad quantity  →  400 invalid_request        │
//! │  Product or sale not found                →  404 not_found              │
//! │  Insufficient stock                       →  409 insufficient_stock     │
//! │  Storage failure                          →  500 internal (detail       │
//! │                                              logged, never leaked)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use vela_core::CoreError;
use vela_engine::EngineError;

/// An error ready to leave the process as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Domain(domain) => match &domain {
                CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => {
                    ApiError::not_found(domain.to_string())
                }
                CoreError::InsufficientStock { .. } => ApiError::new(
                    StatusCode::CONFLICT,
                    "insufficient_stock",
                    domain.to_string(),
                ),
                CoreError::InvalidPaymentAmount { .. } | CoreError::Validation(_) => {
                    ApiError::bad_request(domain.to_string())
                }
            },
            EngineError::Storage(storage) => {
                // Internal detail stays in the log.
                error!(error = %storage, "Storage failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_mapping() {
        let err: ApiError =
            EngineError::Domain(CoreError::SaleNotFound("x".to_string())).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = EngineError::Domain(CoreError::InsufficientStock {
            product: "Soap".to_string(),
            available: 1,
            requested: 5,
        })
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "insufficient_stock");

        let err: ApiError = EngineError::Domain(CoreError::InvalidPaymentAmount {
            reason: "short".to_string(),
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
