use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Body sent with every 500; the cause only goes to the log
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing {0}")]
    MissingField(String),

    #[error("Unable to determine client address")]
    MissingAddress,

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(slotlog_core::Error),
}

impl AppError {
    /// Route core errors caused by the caller to their own variants
    pub fn from_core(err: slotlog_core::Error) -> Self {
        match err {
            slotlog_core::Error::MissingField(field) => AppError::MissingField(field),
            slotlog_core::Error::MissingAddress => AppError::MissingAddress,
            slotlog_core::Error::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Internal(other),
        }
    }
}

impl From<slotlog_core::Error> for AppError {
    fn from(err: slotlog_core::Error) -> Self {
        Self::from_core(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingField { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingAddress => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
            return (status, INTERNAL_ERROR_BODY).into_response();
        }

        (status, self.to_string()).into_response()
    }
}
