//! Behaviour shared by the resources served over HTTP.

use crate::error::{DomainError, DomainResult};

/// A resource owned by a backing store and exposed by a CRUD handler set.
pub trait Resource {
    /// Singular name used in client-facing messages, e.g. `"User"`.
    const NAME: &'static str;
}

/// Presence check for a required request field.
pub fn require<T>(value: Option<T>, field: &'static str) -> DomainResult<T> {
    value.ok_or(DomainError::missing(field))
}
