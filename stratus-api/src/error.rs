//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use stratus_core::constants::{MESSAGE_CITY_NOT_FOUND, MESSAGE_INTERNAL_ERROR};
use stratus_core::error::StratusError;

use crate::dto::MessageResponse;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = MessageResponse {
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<StratusError> for ApiError {
    fn from(err: StratusError) -> Self {
        match &err {
            StratusError::UnknownCity(city) => {
                tracing::info!(city = %city, "Provider rejected city");
                ApiError::not_found(MESSAGE_CITY_NOT_FOUND)
            }
            _ => {
                tracing::error!(error = %err, "Weather lookup failed");
                ApiError::internal(MESSAGE_INTERNAL_ERROR)
            }
        }
    }
}
