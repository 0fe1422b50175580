//! Facade error taxonomy.
//!
//! # Invariants
//! - Field-rule failures and unresolved references are distinct variants.
//! - `NotFound` names the operation target; `MissingDependency` names a
//!   referenced entity.

use crate::model::{EntityId, EntityKind, ValidationError};
use crate::repo::RepoError;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error returned by every `CatalogFacade` operation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("referenced {kind} {id} does not exist")]
    MissingDependency { kind: EntityKind, id: EntityId },
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },
    #[error("transient storage failure: {0}")]
    TransientFailure(String),
    /// Non-retryable backend fault (corrupt rows, schema mismatch, I/O).
    #[error("storage failure: {0}")]
    Storage(#[source] RepoError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl CatalogError {
    /// HTTP status class a transport layer should report for this error.
    pub fn status_class(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::MissingDependency { .. } | Self::ConstraintViolation(_) => {
                400
            }
            Self::NotFound { .. } => 404,
            Self::TransientFailure(_) => 503,
            Self::Storage(_) | Self::Hashing(_) => 500,
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::MissingDependency { .. } => "missing_dependency",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::NotFound { .. } => "not_found",
            Self::TransientFailure(_) => "transient_failure",
            Self::Storage(_) => "storage",
            Self::Hashing(_) => "hashing",
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: EntityId) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn missing(kind: EntityKind, id: EntityId) -> Self {
        Self::MissingDependency { kind, id }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Constraint(message) => Self::ConstraintViolation(message),
            RepoError::Transient(message) => Self::TransientFailure(message),
            other => Self::Storage(other),
        }
    }
}
