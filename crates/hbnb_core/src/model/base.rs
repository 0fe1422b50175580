//! Shared entity identity, timestamps and the storage-facing entity contract.
//!
//! # Invariants
//! - `id` and `created_at` never change after construction.
//! - `updated_at` strictly increases on every successful mutation, even when
//!   two mutations land inside the same clock tick.
//! - Timestamps carry microsecond precision so they survive a round trip
//!   through integer storage columns unchanged.

use crate::model::validation::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier shared by every catalog entity.
pub type EntityId = Uuid;

/// Entity families stored by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Amenity,
    Place,
    Review,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Amenity => "amenity",
            Self::Place => "place",
            Self::Review => "review",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and lifecycle timestamps common to all entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub(crate) id: EntityId,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl RecordMeta {
    /// Creates metadata with a fresh v4 identifier and equal timestamps.
    pub fn new() -> Self {
        let now = now_micros();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Refreshes `updated_at`, guaranteeing it moves past the previous value.
    pub(crate) fn touch(&mut self) {
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = now_micros().max(floor);
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Current UTC time truncated to whole microseconds.
pub(crate) fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Typed value used for attribute lookups (`get_by_attribute`).
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Id(EntityId),
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl From<EntityId> for AttributeValue {
    fn from(value: EntityId) -> Self {
        Self::Id(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Contract every stored entity fulfils for the repository layer.
///
/// Repositories are generic over this trait, so the in-memory and SQLite
/// backends apply identical validation and timestamp rules.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Partial-field update accepted by `apply`.
    type Patch: Send + Sync;

    const KIND: EntityKind;

    /// Attribute names accepted by attribute lookups.
    const ATTRIBUTES: &'static [&'static str];

    /// Attributes that must be unique across all stored records of this kind.
    const UNIQUE_ATTRIBUTES: &'static [&'static str] = &[];

    fn meta(&self) -> &RecordMeta;

    fn id(&self) -> EntityId {
        self.meta().id()
    }

    /// Returns the current value of a named attribute, `None` when unknown.
    fn attribute(&self, name: &str) -> Option<AttributeValue>;

    /// Validates and applies a partial update, refreshing `updated_at`.
    ///
    /// On error the entity is left unchanged.
    fn apply(&mut self, patch: &Self::Patch) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
    use super::RecordMeta;

    #[test]
    fn touch_strictly_advances_updated_at() {
        let mut meta = RecordMeta::new();
        let created = meta.created_at();
        let mut previous = meta.updated_at();

        for _ in 0..100 {
            meta.touch();
            assert!(meta.updated_at() > previous);
            previous = meta.updated_at();
        }
        assert_eq!(meta.created_at(), created);
    }

    #[test]
    fn new_meta_timestamps_have_microsecond_precision() {
        let meta = RecordMeta::new();
        assert_eq!(meta.created_at().timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(meta.created_at(), meta.updated_at());
    }
}
