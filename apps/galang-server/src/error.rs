use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use galang_core::Error;
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;

/// Errors surfaced to HTTP clients as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Malformed request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Core(err) => match err {
                Error::Validation(_) | Error::InvalidAmount(_) => StatusCode::BAD_REQUEST,
                Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
                Error::Forbidden(_) => StatusCode::FORBIDDEN,
                Error::NotFound { .. } => StatusCode::NOT_FOUND,
                Error::Conflict(_)
                | Error::AlreadyEnded(_)
                | Error::CampaignEnded(_)
                | Error::InvalidState(_)
                | Error::InsufficientFunds { .. } => StatusCode::CONFLICT,
                Error::Gateway(_) => StatusCode::BAD_GATEWAY,
                Error::Database(_) | Error::Io(_) | Error::Csv(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors that stop the process or a CLI command
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] Error),

    #[error("Xendit client error: {0}")]
    Xendit(#[from] galang_xendit::XenditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (Error::InvalidAmount("low".into()), StatusCode::BAD_REQUEST),
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::forbidden("no"), StatusCode::FORBIDDEN),
            (Error::not_found("Campaign", 7), StatusCode::NOT_FOUND),
            (Error::CampaignEnded(7), StatusCode::CONFLICT),
            (
                Error::InsufficientFunds {
                    requested: 10,
                    available: 5,
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::Gateway(galang_xendit::XenditError::Config("no key".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }
}
