use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },

    #[error("unknown ajax action: {0:?}")]
    UnknownAction(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn config(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            key,
            reason: reason.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Unrouted ajax actions answer "0" with 400.
            AppError::UnknownAction(action) => {
                tracing::warn!(target: "http", action = %action, "rejected unknown ajax action");
                (StatusCode::BAD_REQUEST, "0").into_response()
            }
            other => {
                tracing::error!(target: "http", error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
