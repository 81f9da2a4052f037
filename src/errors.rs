use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Failure taxonomy for one authorization decision. Every variant is caught
/// at the orchestrator boundary and collapsed to the empty denial shape;
/// the variant itself only reaches operator logs.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("directory unavailable: {0}")]
    DirectoryUnavailable(String),
    #[error("identity not found: {0}")]
    IdentityNotFound(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed(message.into())
    }

    pub fn directory_unavailable(message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable(message.into())
    }

    pub fn identity_not_found(message: impl Into<String>) -> Self {
        Self::IdentityNotFound(message.into())
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable label used in denial logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AuthenticationFailed(_) => "authentication_failed",
            AppError::DirectoryUnavailable(_) => "directory_unavailable",
            AppError::IdentityNotFound(_) => "identity_not_found",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Configuration(_) => "configuration",
            AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::AuthenticationFailed(_) | AppError::IdentityNotFound(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::DirectoryUnavailable(_) | AppError::StorageUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
