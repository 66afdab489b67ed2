//! Error types for nestforge server.
//!
//! [`ServerError`] is the only place where failures become HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nestforge_core::BuildFailure;

use crate::protocol::ErrorBody;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Core error.
    #[error(transparent)]
    Core(#[from] nestforge_core::Error),

    /// Build stopped before completing every stage.
    #[error(transparent)]
    Build(#[from] BuildFailure),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid listen address or bind failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Core(_) | Self::Build(_) => StatusCode::BAD_REQUEST,
            Self::Task(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Core(e) => ErrorBody::new(e.kind(), &e.to_string(), e.line()),
            Self::Build(failure) => {
                let e = &failure.error;
                ErrorBody::new(e.kind(), &e.to_string(), e.line())
                    .with_status(failure.status.clone())
            }
            Self::Task(_) => ErrorBody::new("InternalError", "request handler failed", None),
            Self::Io(e) => ErrorBody::new("IoError", &e.to_string(), None),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            Self::Build(failure) => {
                tracing::error!("Build failed during {} stage: {:?}", failure.stage, failure.error)
            }
            other => tracing::error!("Request failed: {:?}", other),
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
