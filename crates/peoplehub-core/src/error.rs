//! Common error types for peoplehub.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors shared across crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more form fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A person with the specified ID was not found.
    #[error("person not found: {0}")]
    PersonNotFound(String),
}
