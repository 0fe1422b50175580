//! Catalog facade: the single entry point over the four repositories.
//!
//! # Responsibility
//! - Compose repositories and enforce cross-entity rules (reference
//!   existence, email uniqueness, cascading deletes).
//! - Translate repository failures into `CatalogError`.
//!
//! # Invariants
//! - Field validation runs before any reference lookup and before any write.
//! - A failed operation performs no write.
//! - Cascades take the gate exclusively; every other operation takes it
//!   shared. Readers never observe a half-finished cascade, and a reference
//!   check cannot race with the deletion of the referenced entity.
//! - Cascades are planned before any write, delete children before their
//!   parent and apply all-or-nothing.
//! - A transient repository failure is retried once per repository call.

use crate::config::{CatalogConfig, StorageBackend};
use crate::model::{Amenity, Entity, EntityId, Place, Review, User};
use crate::repo::{InMemoryRepository, RepoResult, Repository, SqliteStore};
use crate::service::error::{CatalogError, CatalogResult};
use crate::service::password::PasswordHasher;
use log::{info, warn};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One repository per entity type.
///
/// Backends may be mixed. `shared_store` is set only when all four
/// repositories live in that store; cascades then commit in one transaction
/// instead of undoing applied steps on failure.
pub struct CatalogRepositories {
    pub users: Box<dyn Repository<User>>,
    pub amenities: Box<dyn Repository<Amenity>>,
    pub places: Box<dyn Repository<Place>>,
    pub reviews: Box<dyn Repository<Review>>,
    pub shared_store: Option<SqliteStore>,
}

impl CatalogRepositories {
    pub fn in_memory() -> Self {
        Self {
            users: Box::new(InMemoryRepository::<User>::new()),
            amenities: Box::new(InMemoryRepository::<Amenity>::new()),
            places: Box::new(InMemoryRepository::<Place>::new()),
            reviews: Box::new(InMemoryRepository::<Review>::new()),
            shared_store: None,
        }
    }

    /// All four repositories share `store`'s connection.
    pub fn sqlite(store: &SqliteStore) -> Self {
        Self {
            users: Box::new(store.repository::<User>()),
            amenities: Box::new(store.repository::<Amenity>()),
            places: Box::new(store.repository::<Place>()),
            reviews: Box::new(store.repository::<Review>()),
            shared_store: Some(store.clone()),
        }
    }
}

/// Orchestration layer over the catalog repositories.
pub struct CatalogFacade {
    pub(crate) repos: CatalogRepositories,
    pub(crate) hasher: Box<dyn PasswordHasher>,
    cascade_gate: RwLock<()>,
}

impl CatalogFacade {
    pub fn new(repos: CatalogRepositories, hasher: impl PasswordHasher + 'static) -> Self {
        Self {
            repos,
            hasher: Box::new(hasher),
            cascade_gate: RwLock::new(()),
        }
    }

    /// Facade over fresh in-memory repositories.
    pub fn in_memory(hasher: impl PasswordHasher + 'static) -> Self {
        Self::new(CatalogRepositories::in_memory(), hasher)
    }

    /// Opens the configured storage backend and builds a facade over it.
    ///
    /// # Errors
    /// - `Storage` when the SQLite database cannot be opened or migrated.
    pub fn from_config(
        config: &CatalogConfig,
        hasher: impl PasswordHasher + 'static,
    ) -> CatalogResult<Self> {
        let repos = match &config.storage {
            StorageBackend::Memory => CatalogRepositories::in_memory(),
            StorageBackend::Sqlite { path } => {
                CatalogRepositories::sqlite(&SqliteStore::open(path)?)
            }
        };
        info!(
            "event=facade_init module=service status=ok backend={}",
            config.storage.name()
        );
        Ok(Self::new(repos, hasher))
    }

    pub(crate) fn shared_gate(&self) -> RwLockReadGuard<'_, ()> {
        // The gate guards no data, so a poisoned lock is still usable.
        self.cascade_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn exclusive_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.cascade_gate
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn hash_password(&self, plaintext: &str) -> CatalogResult<String> {
        self.hasher
            .hash(plaintext)
            .map_err(|err| CatalogError::Hashing(err.to_string()))
    }
}

/// Runs one repository call, retrying once when it fails transiently.
pub(crate) fn retry_transient<T>(
    event: &'static str,
    mut call: impl FnMut() -> RepoResult<T>,
) -> CatalogResult<T> {
    match call() {
        Err(err) if err.is_transient() => {
            warn!("event={event} module=service status=retry error_code=transient_failure");
            call().map_err(CatalogError::from)
        }
        other => other.map_err(CatalogError::from),
    }
}

/// Loads the operation target or fails with `NotFound`.
pub(crate) fn require<E: Entity>(
    repo: &dyn Repository<E>,
    event: &'static str,
    id: EntityId,
) -> CatalogResult<E> {
    retry_transient(event, || repo.get(id))?.ok_or(CatalogError::not_found(E::KIND, id))
}

/// Checks that a referenced entity exists or fails with `MissingDependency`.
pub(crate) fn ensure_reference<E: Entity>(
    repo: &dyn Repository<E>,
    event: &'static str,
    id: EntityId,
) -> CatalogResult<()> {
    match retry_transient(event, || repo.get(id))? {
        Some(_) => Ok(()),
        None => Err(CatalogError::missing(E::KIND, id)),
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_reference, require, retry_transient};
    use crate::model::{Amenity, EntityKind};
    use crate::repo::{InMemoryRepository, RepoError};
    use crate::service::error::CatalogError;
    use uuid::Uuid;

    #[test]
    fn transient_failure_is_retried_exactly_once() {
        let mut calls = 0;
        let result = retry_transient("test", || {
            calls += 1;
            if calls == 1 {
                Err(RepoError::Transient("busy".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 2);

        let mut calls = 0;
        let result: Result<(), _> = retry_transient("test", || {
            calls += 1;
            Err(RepoError::Transient("busy".to_string()))
        });
        assert!(matches!(result, Err(CatalogError::TransientFailure(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn deterministic_failures_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = retry_transient("test", || {
            calls += 1;
            Err(RepoError::Constraint("taken".to_string()))
        });
        assert!(matches!(result, Err(CatalogError::ConstraintViolation(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn target_and_reference_lookups_report_different_errors() {
        let repo = InMemoryRepository::<Amenity>::new();
        let id = Uuid::new_v4();

        let err = require::<Amenity>(&repo, "test", id).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { kind: EntityKind::Amenity, .. }));

        let err = ensure_reference::<Amenity>(&repo, "test", id).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingDependency { kind: EntityKind::Amenity, .. }
        ));
    }
}
