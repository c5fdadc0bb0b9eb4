//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use novel_core::AppError;
use thiserror::Error;

/// Error returned by API handlers, rendered as `{ "error": ... }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<novel_fs::FsError> for ApiError {
    fn from(e: novel_fs::FsError) -> Self {
        ApiError::App(e.into())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {}", e))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::App(AppError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::App(AppError::NotFound(_) | AppError::NoLibrary) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::InvalidSettings(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::App(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::App(AppError::Forbidden(_)) => "Access to this file is not allowed".to_string(),
            ApiError::App(AppError::NotFound(_)) => "File does not exist".to_string(),
            ApiError::App(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        let body = Json(serde_json::json!({ "error": self.message() }));
        (status, body).into_response()
    }
}
