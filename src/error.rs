use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Expired download link. Maps to 410.
    #[error("Gone: {0}")]
    Gone(String),

    /// Upstream payment provider failure. Maps to 502.
    #[error("Payment error: {0}")]
    Payment(String),

    /// Missing or unusable gateway credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// User-facing error strings, centralized so handlers and tests agree.
pub mod msg {
    pub const SCRIPT_NOT_FOUND: &str = "Script not found";
    pub const SCRIPT_IS_FREE: &str = "This script is free";
    pub const ORDER_NOT_FOUND: &str = "Order not found";
    pub const DOWNLOAD_LINK_INVALID: &str = "Download link is invalid";
    pub const DOWNLOAD_LINK_EXPIRED: &str = "Download link has expired";
    pub const VALID_EMAIL_REQUIRED: &str = "Valid email is required";
    pub const ORDER_ID_REQUIRED: &str = "Order ID is required";
    pub const PAYPAL_NOT_CONFIGURED: &str = "PayPal is not configured";
    pub const PAYPAL_ORDER_FAILED: &str = "Failed to create PayPal order";
    pub const PAYMENT_CAPTURE_FAILED: &str = "Payment capture failed";
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    pub const PASSWORD_TOO_SHORT: &str = "New password must be at least 8 characters";
    pub const CURRENT_PASSWORD_WRONG: &str = "Current password is incorrect";
    pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";
    pub const FILE_TOO_LARGE: &str = "File exceeds the maximum allowed size";
}

/// Shorthand for the `Option -> AppError::NotFound` pattern in handlers.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg.clone()))
            }
            AppError::Gone(msg) => (StatusCode::GONE, "Gone", Some(msg.clone())),
            AppError::Payment(detail) => {
                tracing::error!("Payment gateway error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "Payment processing failed",
                    Some(detail.clone()),
                )
            }
            AppError::Config(detail) => {
                tracing::error!("Configuration error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Service misconfigured",
                    None,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
