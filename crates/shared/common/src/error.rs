//! Unified error handling and translation to HTTP responses.
//!
//! Handlers propagate [`AppError`] with `?` and hand the final error to
//! [`AppError::reply`], which translates it, logs exactly one record and
//! builds the JSON response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::Level;

use crate::response::ErrorResponse;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    /// No record matches the requested ID
    #[error("Resource not found")]
    NotFound,

    /// A required request field was absent or null
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Any failure reported by the store
    #[error("{0}")]
    Store(#[from] DbErr),

    /// Body was not valid JSON for the endpoint
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True for every signal meaning "no record matches the ID".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound
                | AppError::Store(DbErr::RecordNotFound(_))
                | AppError::Store(DbErr::RecordNotUpdated)
        )
    }

    /// Translate, log once and render the error as a response.
    pub fn reply(&self, resource: &str, operation: &str, id: Option<&str>) -> Response {
        let translation = translate(self, resource);
        translation.log(resource, operation, id);
        translation.into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MissingField(field) => AppError::MissingField(field),
        }
    }
}

/// Outcome of translating an error: what to send and how loudly to log it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub status: StatusCode,
    pub level: Level,
    pub message: String,
}

/// Map an error to its HTTP status, log level and client message.
pub fn translate(err: &AppError, resource: &str) -> Translation {
    if err.is_not_found() {
        return Translation {
            status: StatusCode::NOT_FOUND,
            level: Level::WARN,
            message: format!("{} not found", resource),
        };
    }

    match err {
        AppError::BadRequest(msg) => Translation {
            status: StatusCode::BAD_REQUEST,
            level: Level::WARN,
            message: msg.clone(),
        },
        // Store failures (unique violations included) return the raw store message
        other => Translation {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            level: Level::ERROR,
            message: other.to_string(),
        },
    }
}

impl Translation {
    /// Emit the single record describing a failed operation.
    pub fn log(&self, resource: &str, operation: &str, id: Option<&str>) {
        let status = self.status.as_u16();

        if self.level == Level::WARN {
            tracing::warn!(resource, operation, id, status, "{}", self.message);
        } else {
            tracing::error!(resource, operation, id, status, "{}", self.message);
        }
    }
}

impl IntoResponse for Translation {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}
