//! Mapping from domain errors to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use boxoffice_core::{AuditError, AuthError, BookingError, EventError, UserError};

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An HTTP error with a client-facing message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Log the detail and hide it from the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", detail);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) => Self::not_found(err.to_string()),
            BookingError::SoldOut | BookingError::AlreadyUsed | BookingError::Cancelled => {
                Self::bad_request(err.to_string())
            }
            BookingError::Conflict(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            BookingError::Internal(_) => Self::internal(err),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => Self::not_found("Event not found"),
            EventError::CapacityBelowSold { .. } => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            EventError::InvalidInput(msg) => Self::bad_request(msg),
            EventError::Database(_) => Self::internal(err),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken(_) => {
                Self::new(StatusCode::CONFLICT, "User with this email already exists")
            }
            UserError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            UserError::InvalidInput(msg) => Self::bad_request(msg),
            UserError::PasswordHash(_) | UserError::Database(_) => Self::internal(err),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::internal(format!("Failed to generate authentication token: {}", err))
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        Self::internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request format: {}", rejection.body_text()))
    }
}

/// Parse a resource id from the path, rejecting anything that isn't a UUID.
pub fn parse_id(raw: &str, what: &str) -> Result<String, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}
