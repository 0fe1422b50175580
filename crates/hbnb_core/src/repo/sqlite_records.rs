//! Row mappings between catalog entities and SQLite tables.
//!
//! # Invariants
//! - `COLUMNS` order matches `column_values()` order.
//! - Identifiers are stored as hyphenated lowercase UUID text.
//! - Booleans are stored as `0`/`1`; any other value is invalid persisted data.

use crate::model::{Amenity, Entity, EntityId, Place, RecordMeta, Review, User};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

/// Association table linking an owning row to many target rows.
#[derive(Debug, Clone, Copy)]
pub struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
}

/// Table mapping for an entity persisted by `SqliteRepository`.
///
/// `id`, `created_at` and `updated_at` columns are handled generically and are
/// not part of `COLUMNS`.
pub trait SqliteRecord: Entity {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const LINKS: Option<LinkTable> = None;

    fn column_values(&self) -> Vec<Value>;

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self>;

    /// Identifiers stored in the association table, when `LINKS` is set.
    fn linked_ids(&self) -> &[EntityId] {
        &[]
    }

    fn set_linked_ids(&mut self, _ids: Vec<EntityId>) {}
}

impl SqliteRecord for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "email", "password_hash", "is_admin"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.first_name.clone()),
            Value::Text(self.last_name.clone()),
            Value::Text(self.email.clone()),
            Value::Text(self.password_hash.clone()),
            Value::Integer(bool_to_int(self.is_admin)),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            is_admin: int_to_bool(row.get("is_admin")?, "users.is_admin")?,
        })
    }
}

impl SqliteRecord for Amenity {
    const TABLE: &'static str = "amenities";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: row.get("name")?,
        })
    }
}

impl SqliteRecord for Place {
    const TABLE: &'static str = "places";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "price",
        "latitude",
        "longitude",
        "owner_id",
    ];
    const LINKS: Option<LinkTable> = Some(LinkTable {
        table: "place_amenity",
        owner_column: "place_id",
        target_column: "amenity_id",
    });

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
            Value::Real(self.price),
            Value::Real(self.latitude),
            Value::Real(self.longitude),
            id_value(self.owner_id),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let owner_id: String = row.get("owner_id")?;
        Ok(Self {
            meta,
            title: row.get("title")?,
            description: row.get("description")?,
            price: row.get("price")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            owner_id: parse_uuid(&owner_id, "places.owner_id")?,
            amenities: Vec::new(),
        })
    }

    fn linked_ids(&self) -> &[EntityId] {
        &self.amenities
    }

    fn set_linked_ids(&mut self, mut ids: Vec<EntityId>) {
        ids.sort_unstable();
        self.amenities = ids;
    }
}

impl SqliteRecord for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static [&'static str] = &["text", "rating", "user_id", "place_id"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.text.clone()),
            Value::Integer(i64::from(self.rating)),
            id_value(self.user_id),
            id_value(self.place_id),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let rating: i64 = row.get("rating")?;
        let user_id: String = row.get("user_id")?;
        let place_id: String = row.get("place_id")?;
        Ok(Self {
            meta,
            text: row.get("text")?,
            rating: i32::try_from(rating).map_err(|_| {
                RepoError::InvalidData(format!("invalid rating `{rating}` in reviews.rating"))
            })?,
            user_id: parse_uuid(&user_id, "reviews.user_id")?,
            place_id: parse_uuid(&place_id, "reviews.place_id")?,
        })
    }
}

pub(crate) fn id_value(id: EntityId) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
