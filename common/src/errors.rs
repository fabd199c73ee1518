//! Application error types.
//!
//! Every adapter operation fails with one [`AppError`]; its [`ErrorKind`] is
//! the failure taxonomy callers use to decide on retry and presentation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::ApiResponse;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Failure categories of the capability contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum ErrorKind {
    /// The adapter does not implement the capability at all.
    Unsupported,
    /// The backend session could not be established or was lost.
    ConnectionFailure,
    /// The backend rejected or errored on a well-formed request.
    QueryFailure,
    /// A caller-supplied identifier, filter or option is malformed.
    InvalidArgument,
    /// The operation deadline expired.
    Cancelled,
}

impl ErrorKind {
    /// Whether a higher layer may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ConnectionFailure | ErrorKind::Cancelled)
    }

    /// Stable error code used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::ConnectionFailure => "CONNECTION_FAILURE",
            ErrorKind::QueryFailure => "QUERY_FAILURE",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Cancelled => "CANCELLED",
        }
    }

    /// HTTP status the kind is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Unsupported => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::ConnectionFailure => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::QueryFailure => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{operation} is not supported by {backend}")]
    Unsupported { operation: String, backend: String },

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("query failure: {0}")]
    QueryFailure(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),
}

impl AppError {
    /// Builds an `Unsupported` error for an operation/backend pair.
    pub fn unsupported(operation: impl ToString, backend: impl ToString) -> Self {
        AppError::Unsupported {
            operation: operation.to_string(),
            backend: backend.to_string(),
        }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unsupported { .. } => ErrorKind::Unsupported,
            AppError::ConnectionFailure(_) => ErrorKind::ConnectionFailure,
            AppError::QueryFailure(_) => ErrorKind::QueryFailure,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Shorthand for `self.kind().is_retryable()`.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => AppError::InvalidArgument(e.to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::ConnectionFailure(err.to_string()),
            other => AppError::QueryFailure(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_timeout()
            || err.is_connection_dropped()
        {
            AppError::ConnectionFailure(err.to_string())
        } else {
            AppError::QueryFailure(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::ConnectionFailure || kind == ErrorKind::QueryFailure {
            tracing::warn!(code = kind.code(), error = %self, "request failed");
        }
        let body = ApiResponse::err(kind.code(), self.to_string());
        (kind.status(), Json(body)).into_response()
    }
}
