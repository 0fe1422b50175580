//! Catalog use-case layer.
//!
//! # Responsibility
//! - Expose one facade operation per catalog use case.
//! - Keep callers decoupled from storage backends and password hashing.

pub mod amenities;
mod cascade;
pub mod error;
pub mod facade;
pub mod password;
pub mod places;
pub mod reviews;
pub mod users;

pub use error::{CatalogError, CatalogResult};
pub use facade::{CatalogFacade, CatalogRepositories};
pub use password::{Argon2PasswordHasher, PasswordError, PasswordHasher};
pub use places::PlaceDetails;
pub use users::UserUpdate;
