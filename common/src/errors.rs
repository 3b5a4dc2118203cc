use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Closed error taxonomy for the notifier pipeline.
///
/// Every variant carries its cause as part of the message so the whole enum
/// stays `Clone`; a single upstream failure can then be handed verbatim to
/// every caller that joined the same in-flight forecast request.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("weather provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("delivery failed: {0}")]
    Dispatch(String),

    #[error("data access error: {0}")]
    DataAccess(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch(message.into())
    }

    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamUnavailable(format!("request timed out: {}", err))
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::DataAccess(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            AppError::DataAccess(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
