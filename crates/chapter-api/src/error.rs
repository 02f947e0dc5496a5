use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use chapter_types::api::ErrorResponse;
use chapter_types::error::AttendanceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error")]
    Database(#[from] anyhow::Error),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Attendance(e) => attendance_status(e),
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Attendance(e) => e.code(),
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// What the client gets to see. Internals stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Attendance(e) => e.to_string(),
            ApiError::Validation(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::InvalidCredentials => "Invalid username or password".to_string(),
            ApiError::Database(_) => "A database error occurred".to_string(),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Database(e) => error!(error = ?e, "Database error"),
            ApiError::Internal(msg) => error!(message = %msg, "Internal error"),
            other => warn!(code = other.code(), message = %other, "Request rejected"),
        }
    }
}

fn attendance_status(e: &AttendanceError) -> StatusCode {
    match e {
        AttendanceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        AttendanceError::AlreadyRsvped | AttendanceError::AlreadyCheckedIn | AttendanceError::CapacityExceeded => {
            StatusCode::CONFLICT
        }
        AttendanceError::NotRsvped | AttendanceError::OutsideGeofence | AttendanceError::PermissionDenied => {
            StatusCode::FORBIDDEN
        }
        AttendanceError::EventNotFound => StatusCode::NOT_FOUND,
        AttendanceError::EventNotInSession
        | AttendanceError::LocationUnavailable
        | AttendanceError::Rejected(_) => StatusCode::BAD_REQUEST,
        AttendanceError::NetworkError(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

// Extractor failures get the same `{error, code}` body as everything else.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
