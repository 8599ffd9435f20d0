use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

/// A share token that could not be turned back into a history list.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("share token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("share token does not contain a history list: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("an export is already in progress")]
    Busy,
    #[error("failed to render report image: {0}")]
    Render(#[from] image::ImageError),
    #[error("failed to build report document: {0}")]
    Document(#[from] lopdf::Error),
    #[error("failed to write report document: {0}")]
    Io(#[from] std::io::Error),
    #[error("export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure reported by the platform share surface or the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("share was cancelled")]
    Cancelled,
    #[error("share was not allowed: {0}")]
    Denied(String),
    #[error("share failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write store file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Busy => Self {
                status: StatusCode::CONFLICT,
                message: err.to_string(),
            },
            other => Self::internal(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
