//! # API Error Types
//!
//! HTTP-facing error type with status-code mapping.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error → Response Mapping                            │
//! │                                                                         │
//! │  CoreError / DbError / CheckoutError                                    │
//! │       │  From impls                                                     │
//! │       ▼                                                                 │
//! │  ApiError (this module)                                                 │
//! │       │  IntoResponse                                                   │
//! │       ▼                                                                 │
//! │  { "error": { "code": "insufficient_stock", "message": "..." } }        │
//! │                                                                         │
//! │  400 bad request      - validation, malformed body, empty cart         │
//! │  401 unauthorized     - missing or invalid bearer token                 │
//! │  403 forbidden        - authenticated but not staff                     │
//! │  404 not found        - unknown, inactive or another user's resource    │
//! │  409 conflict         - insufficient stock, double checkout             │
//! │  500 internal         - database/unexpected (detail logged, not sent)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use boutique_core::CoreError;
use boutique_db::{CheckoutError, DbError};

// =============================================================================
// Error Codes
// =============================================================================

/// Stable machine-readable error codes carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    InsufficientStock,
    Conflict,
    Internal,
}

impl ErrorCode {
    /// Stable string form, matching the serialized representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InsufficientStock => "insufficient_stock",
            ErrorCode::Conflict => "conflict",
            ErrorCode::Internal => "internal",
        }
    }
}

// =============================================================================
// Api Error
// =============================================================================

/// Storefront API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientStock(_) => StatusCode::CONFLICT,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The machine-readable code carried in the response body.
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::ValidationFailed,
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::Forbidden(_) => ErrorCode::Forbidden,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::InsufficientStock(_) => ErrorCode::InsufficientStock,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Internal detail is logged server-side, never sent to clients
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        });

        (self.status(), axum::Json(body)).into_response()
    }
}

// =============================================================================
// Conversions from Lower Layers
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_)
            | CoreError::CartNotFound(_)
            | CoreError::CartLineNotFound(_)
            | CoreError::OrderNotFound(_) => ApiError::NotFound(err.to_string()),

            CoreError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),

            // Double-submitted checkout lands here: the cart is no longer
            // in_progress
            CoreError::InvalidCartStatus { .. } => ApiError::Conflict(err.to_string()),

            CoreError::EmptyCart
            | CoreError::QuantityTooLarge { .. }
            | CoreError::Validation(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(core) => core.into(),
            CheckoutError::Db(db) => db.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InsufficientStock("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_core_error_conversion() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = CoreError::InsufficientStock {
            name: "Eau minérale".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err: ApiError = CoreError::InvalidCartStatus {
            cart_id: "c1".to_string(),
            current_status: "validated".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_db_error_conversion_hides_detail() {
        let err: ApiError = DbError::QueryFailed("secret sql detail".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"insufficient_stock\"");
        assert_eq!(ErrorCode::InsufficientStock.as_str(), "insufficient_stock");
    }
}
