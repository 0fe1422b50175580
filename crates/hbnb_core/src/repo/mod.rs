//! Repository contract and its storage backends.
//!
//! # Responsibility
//! - Define one storage-agnostic CRUD contract shared by every entity type.
//! - Provide an in-memory backend and a SQLite backend with identical
//!   observable behavior.
//!
//! # Invariants
//! - `update` is an atomic read-modify-write per identifier.
//! - Entity validation runs inside `update` through `Entity::apply`, the same
//!   validators the constructors use.
//! - Attributes listed in `Entity::UNIQUE_ATTRIBUTES` are enforced at write
//!   time against live contents and surface as `RepoError::Constraint`.
//! - Repositories never call each other.

pub mod cascade;
pub mod memory_repo;
pub mod sqlite_records;
pub mod sqlite_repo;

use crate::db::DbError;
use crate::model::{AttributeValue, Entity, EntityId, EntityKind, ValidationError};
use rusqlite::ErrorCode;

pub use cascade::{CascadePlan, CascadeStep};
pub use memory_repo::InMemoryRepository;
pub use sqlite_records::SqliteRecord;
pub use sqlite_repo::{SqliteRepository, SqliteStore};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all backends.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A uniqueness (or storage-level integrity) rule rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),
    /// Contention or connectivity failure; the write did not happen and may be retried.
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error("unknown {kind} attribute `{name}`")]
    UnknownAttribute { kind: EntityKind, name: String },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl RepoError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::Transient(value.to_string())
            }
            Some(ErrorCode::ConstraintViolation) => Self::Constraint(value.to_string()),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Storage contract for one entity type.
pub trait Repository<E: Entity>: Send + Sync {
    /// Persists a newly constructed entity and returns the stored form.
    ///
    /// Identity is assigned by the entity constructor, so `add` never mints ids.
    fn add(&self, entity: E) -> RepoResult<E>;

    /// Returns the entity, or `None` when absent. Absence is not an error.
    fn get(&self, id: EntityId) -> RepoResult<Option<E>>;

    /// Returns every stored entity in insertion order.
    fn get_all(&self) -> RepoResult<Vec<E>>;

    /// Returns the first entity whose attribute equals `value`.
    fn get_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Option<E>>;

    /// Returns every entity whose attribute equals `value`, in insertion order.
    fn find_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Vec<E>>;

    /// Applies a validated partial update atomically; `None` when `id` is absent.
    fn update(&self, id: EntityId, patch: &E::Patch) -> RepoResult<Option<E>>;

    /// Removes the entity. Returns `false` when nothing was stored under `id`.
    fn delete(&self, id: EntityId) -> RepoResult<bool>;
}

/// Rejects attribute names the entity does not expose for lookups.
pub(crate) fn ensure_known_attribute<E: Entity>(name: &str) -> RepoResult<()> {
    if E::ATTRIBUTES.contains(&name) {
        Ok(())
    } else {
        Err(RepoError::UnknownAttribute {
            kind: E::KIND,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_known_attribute, RepoError};
    use crate::model::User;

    #[test]
    fn unknown_attributes_are_rejected() {
        assert!(ensure_known_attribute::<User>("email").is_ok());
        let err = ensure_known_attribute::<User>("password_hash").unwrap_err();
        assert!(matches!(err, RepoError::UnknownAttribute { name, .. } if name == "password_hash"));
    }

    #[test]
    fn sqlite_busy_maps_to_transient() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(RepoError::from(busy).is_transient());

        let unique = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: users.email".to_string()),
        );
        assert!(matches!(RepoError::from(unique), RepoError::Constraint(_)));
    }
}
