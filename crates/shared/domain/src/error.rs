//! Domain-level errors.
//!
//! These errors describe problems with request data before it reaches the
//! store. They are independent of infrastructure concerns (HTTP, database).

use thiserror::Error;

/// Domain-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required input field was absent
    #[error("{0} is required")]
    MissingField(&'static str),
}

impl DomainError {
    /// Create a missing field error
    pub fn missing(field: &'static str) -> Self {
        DomainError::MissingField(field)
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
