use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, info};

use crate::formset::wire::FormsetError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("recipe not found")]
    NotFound,
    #[error("missing permission {0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Store(StoreError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            // Deleted by someone else after it was loaded.
            StoreError::RecipeNotFound(_) => Self::NotFound,
            err => Self::Store(err),
        }
    }
}

impl From<FormsetError> for AppError {
    fn from(err: FormsetError) -> Self {
        Self::MalformedRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::NotFound => "Not found".to_owned(),
            AppError::Forbidden(permission) => {
                info!(permission, "permission denied");
                "Permission denied".to_owned()
            }
            AppError::MalformedRequest(message) => message.clone(),
            AppError::Store(_) | AppError::Task(_) => {
                error!(error = %self, "request failed");
                "Internal server error".to_owned()
            }
        };

        (status, body).into_response()
    }
}
