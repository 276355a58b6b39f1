//! Error handling for the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use websub_core::HubError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request failed protocol validation.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Hub(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

impl From<websub_core::Error> for AppError {
    fn from(err: websub_core::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
