use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use roadbook_core::BookingError;

#[derive(Debug)]
pub enum AppError {
    Booking(BookingError),
    AuthenticationError(String),
    Anyhow(anyhow::Error),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        Self::Booking(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Booking(BookingError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            AppError::Booking(BookingError::Conflict(msg)) => (StatusCode::CONFLICT, msg),
            AppError::Booking(BookingError::Forbidden(msg)) => (StatusCode::FORBIDDEN, msg),
            AppError::Booking(BookingError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Booking(BookingError::Internal(msg)) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
