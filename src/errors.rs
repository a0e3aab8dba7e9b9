use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::AuthError;

pub const AUTH_FAILURE_CODE: &str = "AUTH_FAILURE";
pub const AUTH_FAILURE_MESSAGE: &str = "Internal authentication error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: String,
    },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("authentication failure: {cause}")]
    AuthFailure { cause: String },
}

/// Error body returned by every failing route.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description.
    #[schema(example = "Internal authentication error")]
    pub error: String,
    /// Stable machine-readable code.
    #[schema(example = "AUTH_FAILURE")]
    pub code: String,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::AuthFailure {
            cause: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            Self::NotFound { message } => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
            Self::AuthFailure { cause } => {
                tracing::error!(error = %cause, "authentication handler failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AUTH_FAILURE_CODE,
                    AUTH_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
