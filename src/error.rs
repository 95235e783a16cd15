use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::payment::PaymentError;
use crate::validation::{FieldError, ValidationErrors};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid course fixture: {0}")]
    Fixture(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Login required".to_string()),
            AppError::Validation(errors) => {
                let message = errors.to_string();
                fields = Some(errors.into_fields());
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            AppError::Payment(PaymentError::Validation(errors)) => {
                let message = errors.to_string();
                fields = Some(errors.into_fields());
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            AppError::Payment(e @ PaymentError::Declined(_)) => {
                (StatusCode::PAYMENT_REQUIRED, e.to_string())
            }
            AppError::Payment(e @ PaymentError::Network(_)) => {
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Payment(e @ PaymentError::Unavailable(_)) => {
                (StatusCode::CONFLICT, e.to_string())
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Migration(e) => {
                error!("migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            e @ (AppError::Io(_) | AppError::Json(_) | AppError::Config(_) | AppError::Fixture(_)) => {
                error!("{}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
            fields,
        });

        (status, body).into_response()
    }
}
