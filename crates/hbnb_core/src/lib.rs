//! Core domain logic for the HBnB property-rental catalog.
//! This crate owns the entity rules, storage backends and the facade that
//! enforces cross-entity invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    Amenity, AmenityPatch, AttributeValue, Entity, EntityId, EntityKind, NewPlace, NewReview,
    NewUser, Place, PlacePatch, RecordMeta, Review, ReviewPatch, User, UserPatch,
    ValidationError, ValidationKind,
};
pub use repo::{
    CascadePlan, CascadeStep, InMemoryRepository, RepoError, RepoResult, Repository,
    SqliteRepository, SqliteStore,
};
pub use service::{
    Argon2PasswordHasher, CatalogError, CatalogFacade, CatalogRepositories, CatalogResult,
    PasswordError, PasswordHasher, PlaceDetails, UserUpdate,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
