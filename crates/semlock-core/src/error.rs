//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A semaphore name must contain at least one non-whitespace character
    #[error("semaphore name must not be empty")]
    EmptySemaphoreName,

    /// Semaphore names are single tokens on the wire
    #[error("semaphore name must not contain whitespace: {name:?}")]
    WhitespaceInSemaphoreName { name: String },

    /// A username must contain at least one non-whitespace character
    #[error("username must not be empty")]
    EmptyUsername,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
