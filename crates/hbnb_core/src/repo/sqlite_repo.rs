//! SQLite repository backend.
//!
//! # Responsibility
//! - Translate the repository contract into SQL over the catalog schema.
//! - Keep association rows (`place_amenity`) in step with their owner row.
//!
//! # Invariants
//! - Every write runs in one `IMMEDIATE` transaction: an update's read,
//!   validation and column writes happen atomically, and a delete removes
//!   association rows together with the owner row.
//! - A cascade plan commits as a whole or not at all.
//! - `updated_at` is written by the same statement as the changed columns;
//!   there are no database-side triggers.
//! - `get_all` and `find_by_attribute` return rows in insertion (`rowid`) order.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory};
use crate::model::{Amenity, AttributeValue, EntityId, Place, RecordMeta, Review, User};
use crate::repo::cascade::{CascadePlan, CascadeStep};
use crate::repo::sqlite_records::{id_value, parse_uuid, SqliteRecord};
use crate::repo::{ensure_known_attribute, RepoError, RepoResult, Repository};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared handle to one migrated SQLite connection.
///
/// Repositories created from the same store share the connection, so all
/// entity types live in one database and one transaction domain.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a private in-memory database with migrations applied.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already opened connection.
    ///
    /// # Errors
    /// - `InvalidData` when the connection's schema is not fully migrated.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if version != latest_version() {
            return Err(RepoError::InvalidData(format!(
                "catalog schema version {version} does not match expected {}",
                latest_version()
            )));
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn repository<E: SqliteRecord>(&self) -> SqliteRepository<E> {
        SqliteRepository {
            store: self.clone(),
            _entity: PhantomData,
        }
    }

    /// Applies every step of `plan` in one `IMMEDIATE` transaction.
    ///
    /// Any failing step rolls the whole plan back.
    pub fn apply_cascade(&self, plan: &CascadePlan) -> RepoResult<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for step in plan.steps() {
                match step {
                    CascadeStep::RemoveReview(review) => {
                        delete_row::<Review>(&tx, review.id())?;
                    }
                    CascadeStep::RemovePlace(place) => {
                        delete_row::<Place>(&tx, place.id())?;
                    }
                    CascadeStep::RemoveUser(user) => {
                        delete_row::<User>(&tx, user.id())?;
                    }
                    CascadeStep::RemoveAmenity(amenity) => {
                        delete_row::<Amenity>(&tx, amenity.id())?;
                    }
                    CascadeStep::DetachAmenity { place, amenity_id } => {
                        let patch = CascadeStep::detach_patch(place, *amenity_id);
                        update_row::<Place>(&tx, place.id(), &patch)?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn with_conn<T>(&self, work: impl FnOnce(&mut Connection) -> RepoResult<T>) -> RepoResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| RepoError::Transient("sqlite connection lock poisoned".to_string()))?;
        work(&mut *conn)
    }
}

/// SQLite-backed repository for one entity type.
pub struct SqliteRepository<E> {
    store: SqliteStore,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SqliteRecord> Repository<E> for SqliteRepository<E> {
    fn add(&self, entity: E) -> RepoResult<E> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            insert_record(&tx, &entity)?;
            replace_links(&tx, &entity)?;
            tx.commit()?;
            Ok(entity)
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<E>> {
        self.store.with_conn(|conn| load_one(conn, id))
    }

    fn get_all(&self) -> RepoResult<Vec<E>> {
        self.store.with_conn(|conn| {
            let sql = format!("{} ORDER BY rowid ASC;", select_sql::<E>());
            query_records(conn, &sql, Vec::new())
        })
    }

    fn get_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Option<E>> {
        ensure_known_attribute::<E>(name)?;
        self.store.with_conn(|conn| {
            let sql = format!(
                "{} WHERE {name} = ?1 ORDER BY rowid ASC LIMIT 1;",
                select_sql::<E>()
            );
            let found = query_records(conn, &sql, vec![attribute_to_sql(value)])?;
            Ok(found.into_iter().next())
        })
    }

    fn find_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Vec<E>> {
        ensure_known_attribute::<E>(name)?;
        self.store.with_conn(|conn| {
            let sql = format!("{} WHERE {name} = ?1 ORDER BY rowid ASC;", select_sql::<E>());
            query_records(conn, &sql, vec![attribute_to_sql(value)])
        })
    }

    fn update(&self, id: EntityId, patch: &E::Patch) -> RepoResult<Option<E>> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let updated = update_row::<E>(&tx, id, patch)?;
            tx.commit()?;
            Ok(updated)
        })
    }

    fn delete(&self, id: EntityId) -> RepoResult<bool> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let removed = delete_row::<E>(&tx, id)?;
            tx.commit()?;
            Ok(removed)
        })
    }
}

fn update_row<E: SqliteRecord>(
    conn: &Connection,
    id: EntityId,
    patch: &E::Patch,
) -> RepoResult<Option<E>> {
    let Some(current) = load_one::<E>(conn, id)? else {
        return Ok(None);
    };

    let mut candidate = current.clone();
    candidate.apply(patch)?;

    let mut assignments = vec!["updated_at = ?1".to_string()];
    let mut values = vec![Value::Integer(to_micros(candidate.meta().updated_at()))];
    let changed = E::COLUMNS
        .iter()
        .zip(current.column_values())
        .zip(candidate.column_values())
        .filter(|((_, before), after)| before != after);
    for ((column, _), after) in changed {
        values.push(after);
        assignments.push(format!("{column} = ?{}", values.len()));
    }
    values.push(id_value(id));
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{};",
        E::TABLE,
        assignments.join(", "),
        values.len()
    );
    conn.execute(&sql, params_from_iter(values))?;

    if current.linked_ids() != candidate.linked_ids() {
        replace_links(conn, &candidate)?;
    }
    Ok(Some(candidate))
}

fn delete_row<E: SqliteRecord>(conn: &Connection, id: EntityId) -> RepoResult<bool> {
    if let Some(link) = E::LINKS {
        conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1;", link.table, link.owner_column),
            [id.to_string()],
        )?;
    }
    let changed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1;", E::TABLE),
        [id.to_string()],
    )?;
    Ok(changed > 0)
}

fn select_sql<E: SqliteRecord>() -> String {
    format!(
        "SELECT id, created_at, updated_at, {} FROM {}",
        E::COLUMNS.join(", "),
        E::TABLE
    )
}

fn load_one<E: SqliteRecord>(conn: &Connection, id: EntityId) -> RepoResult<Option<E>> {
    let sql = format!("{} WHERE id = ?1;", select_sql::<E>());
    let found = query_records(conn, &sql, vec![id_value(id)])?;
    Ok(found.into_iter().next())
}

fn query_records<E: SqliteRecord>(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<E>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_record::<E>(row)?);
    }

    if E::LINKS.is_some() {
        for record in &mut records {
            let ids = load_links::<E>(conn, record.id())?;
            record.set_linked_ids(ids);
        }
    }
    Ok(records)
}

fn parse_record<E: SqliteRecord>(row: &Row<'_>) -> RepoResult<E> {
    let table = E::TABLE;
    let id_text: String = row.get("id")?;
    let meta = RecordMeta {
        id: parse_uuid(&id_text, "id")?,
        created_at: from_micros(row.get("created_at")?, table, "created_at")?,
        updated_at: from_micros(row.get("updated_at")?, table, "updated_at")?,
    };
    E::from_row(meta, row)
}

fn insert_record<E: SqliteRecord>(conn: &Connection, entity: &E) -> RepoResult<()> {
    let meta = entity.meta();
    let mut values = vec![
        id_value(meta.id()),
        Value::Integer(to_micros(meta.created_at())),
        Value::Integer(to_micros(meta.updated_at())),
    ];
    values.extend(entity.column_values());

    let placeholders = (1..=values.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} (id, created_at, updated_at, {}) VALUES ({placeholders});",
        E::TABLE,
        E::COLUMNS.join(", ")
    );
    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

fn load_links<E: SqliteRecord>(conn: &Connection, owner_id: EntityId) -> RepoResult<Vec<EntityId>> {
    let Some(link) = E::LINKS else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {target} FROM {table} WHERE {owner} = ?1 ORDER BY {target} ASC;",
        target = link.target_column,
        table = link.table,
        owner = link.owner_column,
    ))?;
    let mut rows = stmt.query([owner_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, link.target_column)?);
    }
    Ok(ids)
}

fn replace_links<E: SqliteRecord>(conn: &Connection, entity: &E) -> RepoResult<()> {
    let Some(link) = E::LINKS else {
        return Ok(());
    };
    let owner_id = entity.id().to_string();
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1;", link.table, link.owner_column),
        [owner_id.as_str()],
    )?;
    let mut insert = conn.prepare(&format!(
        "INSERT INTO {} ({}, {}) VALUES (?1, ?2);",
        link.table, link.owner_column, link.target_column
    ))?;
    for target in entity.linked_ids() {
        insert.execute(params![owner_id, target.to_string()])?;
    }
    Ok(())
}

fn attribute_to_sql(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Id(id) => id_value(*id),
        AttributeValue::Text(text) => Value::Text(text.clone()),
        AttributeValue::Integer(number) => Value::Integer(*number),
        AttributeValue::Real(number) => Value::Real(*number),
        AttributeValue::Bool(flag) => Value::Integer(i64::from(*flag)),
    }
}

fn to_micros(value: DateTime<Utc>) -> i64 {
    value.timestamp_micros()
}

fn from_micros(value: i64, table: &str, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in {table}.{column}"))
    })
}
