use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `DUPLICATE_REGISTRATION`, `SEAT_UNAVAILABLE`, `CAPACITY_EXCEEDED`,
    /// `DUPLICATE_TEAM_NAME`, `USERNAME_TAKEN`, `REGISTRATION_CLOSED`, `INTERNAL_ERROR`.
    #[schema(example = "SEAT_UNAVAILABLE")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Seat is not available")]
    pub error: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// The user already holds a registration for the event.
    DuplicateRegistration,
    /// The requested seat is reserved, or not part of the event's seat map.
    SeatUnavailable,
    /// An event or team has reached its configured ceiling.
    CapacityExceeded(String),
    DuplicateTeamName,
    UsernameTaken,
    RegistrationClosed,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, error) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".into(),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::DuplicateRegistration => (
                StatusCode::CONFLICT,
                "DUPLICATE_REGISTRATION",
                "Already registered for this event".into(),
            ),
            AppError::SeatUnavailable => (
                StatusCode::CONFLICT,
                "SEAT_UNAVAILABLE",
                "Seat is not available".into(),
            ),
            AppError::CapacityExceeded(msg) => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED", msg),
            AppError::DuplicateTeamName => (
                StatusCode::CONFLICT,
                "DUPLICATE_TEAM_NAME",
                "A team with this name already exists for the event".into(),
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                "Username is already taken".into(),
            ),
            AppError::RegistrationClosed => (
                StatusCode::BAD_REQUEST,
                "REGISTRATION_CLOSED",
                "Event is not accepting registrations".into(),
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                )
            }
        };
        (status, ErrorBody { code, error })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}
