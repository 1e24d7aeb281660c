use axum::http::StatusCode;
use std::path::PathBuf;

/// Failures of the sheet transport or of the rows it returns.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sheet not found at {0}; create an empty file there and restart")]
    NotFound(PathBuf),

    #[error("sheet i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sheet file is not a valid sheet: {0}")]
    Format(#[from] serde_json::Error),

    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("sheet task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

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

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "login required".to_string(),
        }
    }

    pub fn bad_gateway(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MalformedRow { .. } => Self::internal(err),
            StoreError::NotFound(_)
            | StoreError::Io(_)
            | StoreError::Format(_)
            | StoreError::Join(_) => Self::bad_gateway(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
