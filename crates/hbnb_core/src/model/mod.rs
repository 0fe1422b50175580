//! Catalog domain model.
//!
//! # Responsibility
//! - Define the four catalog entities and their field-level invariants.
//! - Expose one validator per field rule, shared by constructors and
//!   partial updates.
//!
//! # Invariants
//! - Every entity carries a `RecordMeta` (`id`, `created_at`, `updated_at`).
//! - Relations are stored by identifier only; there are no object pointers
//!   between entities.
//! - A failed update leaves the entity untouched.

pub mod amenity;
pub mod base;
pub mod place;
pub mod review;
pub mod user;
pub mod validation;

pub use amenity::{Amenity, AmenityPatch};
pub use base::{AttributeValue, Entity, EntityId, EntityKind, RecordMeta};
pub use place::{NewPlace, Place, PlacePatch};
pub use review::{NewReview, Review, ReviewPatch};
pub use user::{NewUser, User, UserPatch};
pub use validation::{ValidationError, ValidationKind};
