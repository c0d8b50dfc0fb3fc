use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("slot unavailable")]
    SlotUnavailable,

    #[error("booking not found")]
    BookingNotFound,

    #[error("station not found")]
    StationNotFound,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::models::slot::InvalidTimeSlot> for AppError {
    fn from(err: crate::models::slot::InvalidTimeSlot) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "authentication_required",
                "you must be logged in to perform this action".to_string(),
            ),
            AppError::SlotUnavailable => (
                StatusCode::CONFLICT,
                "conflict_error",
                "slot_unavailable",
                "this time slot is already booked; please select another time".to_string(),
            ),
            AppError::BookingNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "booking_not_found",
                "no booking with that id".to_string(),
            ),
            AppError::StationNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "station_not_found",
                "no station with that id".to_string(),
            ),
            AppError::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "forbidden",
                reason.clone(),
            ),
            AppError::Validation(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "validation_failed",
                reason.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
