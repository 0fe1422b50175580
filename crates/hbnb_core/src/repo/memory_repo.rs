//! In-memory repository backend.
//!
//! # Responsibility
//! - Store entities in a keyed map for tests and non-durable operation.
//! - Reproduce the SQLite backend's observable behavior exactly.
//!
//! # Invariants
//! - Each identifier owns its own mutex: writers to the same id serialize,
//!   writers to different ids do not block each other.
//! - Lock order is `constraints -> slots -> entry`; an entry lock is never
//!   held while waiting for the slot map.
//! - Entity types with unique attributes route every write through the
//!   `constraints` mutex so check-then-write is atomic.
//! - `get_all` and `find_by_attribute` return insertion order.

use crate::model::{AttributeValue, Entity, EntityId};
use crate::repo::{ensure_known_attribute, RepoError, RepoResult, Repository};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Stored entity cell. `None` marks an entry deleted while another writer
/// still held a handle to it.
type Slot<E> = Arc<Mutex<Option<E>>>;

struct Slots<E> {
    by_id: HashMap<EntityId, (u64, Slot<E>)>,
    order: BTreeMap<u64, EntityId>,
    next_seq: u64,
}

impl<E> Default for Slots<E> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

/// Keyed-map repository backend.
pub struct InMemoryRepository<E: Entity> {
    slots: RwLock<Slots<E>>,
    constraints: Mutex<()>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            constraints: Mutex::new(()),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.read_slots()?.by_id.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }

    fn poisoned(what: &str) -> RepoError {
        RepoError::Transient(format!("in-memory {} {what} lock poisoned", E::KIND))
    }

    fn read_slots(&self) -> RepoResult<RwLockReadGuard<'_, Slots<E>>> {
        self.slots.read().map_err(|_| Self::poisoned("slot map"))
    }

    fn write_slots(&self) -> RepoResult<RwLockWriteGuard<'_, Slots<E>>> {
        self.slots.write().map_err(|_| Self::poisoned("slot map"))
    }

    fn lock_entry(slot: &Slot<E>) -> RepoResult<MutexGuard<'_, Option<E>>> {
        slot.lock().map_err(|_| Self::poisoned("entry"))
    }

    /// Serializes writers only for entity types that carry unique attributes.
    fn constraint_guard(&self) -> RepoResult<Option<MutexGuard<'_, ()>>> {
        if E::UNIQUE_ATTRIBUTES.is_empty() {
            return Ok(None);
        }
        self.constraints
            .lock()
            .map(Some)
            .map_err(|_| Self::poisoned("constraint"))
    }

    fn slot(&self, id: EntityId) -> RepoResult<Option<Slot<E>>> {
        Ok(self
            .read_slots()?
            .by_id
            .get(&id)
            .map(|(_, slot)| Arc::clone(slot)))
    }

    /// Clones live entities matching `keep`, in insertion order.
    fn collect(&self, mut keep: impl FnMut(&E) -> bool, first_only: bool) -> RepoResult<Vec<E>> {
        let slots = self.read_slots()?;
        let mut found = Vec::new();
        for id in slots.order.values() {
            let Some((_, slot)) = slots.by_id.get(id) else {
                continue;
            };
            let entry = Self::lock_entry(slot)?;
            if let Some(entity) = entry.as_ref().filter(|entity| keep(entity)) {
                found.push(entity.clone());
                if first_only {
                    break;
                }
            }
        }
        Ok(found)
    }

    /// Checks unique attributes of `candidate` against every other stored entity.
    ///
    /// Callers hold the constraint guard and no entry lock; `candidate`'s own
    /// entry is skipped.
    fn ensure_unique(&self, candidate: &E) -> RepoResult<()> {
        for name in E::UNIQUE_ATTRIBUTES {
            let Some(value) = candidate.attribute(name) else {
                continue;
            };
            let slots = self.read_slots()?;
            for (id, (_, slot)) in &slots.by_id {
                if *id == candidate.id() {
                    continue;
                }
                let entry = Self::lock_entry(slot)?;
                let taken = entry
                    .as_ref()
                    .and_then(|other| other.attribute(name))
                    .is_some_and(|other| other == value);
                if taken {
                    return Err(RepoError::Constraint(format!(
                        "{} `{name}` already in use",
                        E::KIND
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn add(&self, entity: E) -> RepoResult<E> {
        let _constraints = self.constraint_guard()?;
        self.ensure_unique(&entity)?;

        let mut slots = self.write_slots()?;
        let id = entity.id();
        if slots.by_id.contains_key(&id) {
            return Err(RepoError::Constraint(format!(
                "{} id {id} already stored",
                E::KIND
            )));
        }
        let seq = slots.next_seq;
        slots.next_seq += 1;
        slots
            .by_id
            .insert(id, (seq, Arc::new(Mutex::new(Some(entity.clone())))));
        slots.order.insert(seq, id);
        Ok(entity)
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<E>> {
        let Some(slot) = self.slot(id)? else {
            return Ok(None);
        };
        let entry = Self::lock_entry(&slot)?;
        Ok(entry.clone())
    }

    fn get_all(&self) -> RepoResult<Vec<E>> {
        self.collect(|_| true, false)
    }

    fn get_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Option<E>> {
        ensure_known_attribute::<E>(name)?;
        let matches = self.collect(
            |entity| entity.attribute(name).as_ref() == Some(value),
            true,
        )?;
        Ok(matches.into_iter().next())
    }

    fn find_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Vec<E>> {
        ensure_known_attribute::<E>(name)?;
        self.collect(
            |entity| entity.attribute(name).as_ref() == Some(value),
            false,
        )
    }

    fn update(&self, id: EntityId, patch: &E::Patch) -> RepoResult<Option<E>> {
        let _constraints = self.constraint_guard()?;
        let Some(slot) = self.slot(id)? else {
            return Ok(None);
        };

        let mut entry = Self::lock_entry(&slot)?;
        let Some(current) = entry.as_ref() else {
            return Ok(None);
        };
        let mut candidate = current.clone();
        candidate.apply(patch)?;
        if !E::UNIQUE_ATTRIBUTES.is_empty() {
            // The constraint guard keeps other writers of this type out while
            // the entry is unlocked for the slot scan.
            drop(entry);
            self.ensure_unique(&candidate)?;
            entry = Self::lock_entry(&slot)?;
        }

        *entry = Some(candidate.clone());
        Ok(Some(candidate))
    }

    fn delete(&self, id: EntityId) -> RepoResult<bool> {
        let _constraints = self.constraint_guard()?;
        let mut slots = self.write_slots()?;
        let Some((seq, slot)) = slots.by_id.remove(&id) else {
            return Ok(false);
        };
        slots.order.remove(&seq);
        *Self::lock_entry(&slot)? = None;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryRepository;
    use crate::model::{Amenity, AmenityPatch, AttributeValue, NewUser, User, UserPatch};
    use crate::repo::{RepoError, Repository};

    fn user(email: &str) -> User {
        let input = NewUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "unused".to_string(),
            is_admin: false,
        };
        User::new(&input, "hash").unwrap()
    }

    #[test]
    fn get_all_preserves_insertion_order_across_deletes() {
        let repo = InMemoryRepository::<Amenity>::new();
        let names = ["Wifi", "Pool", "Sauna", "Parking"];
        let stored: Vec<Amenity> = names
            .iter()
            .map(|name| repo.add(Amenity::new(name).unwrap()).unwrap())
            .collect();

        assert!(repo.delete(stored[1].id()).unwrap());
        let listed: Vec<String> = repo
            .get_all()
            .unwrap()
            .iter()
            .map(|amenity| amenity.name().to_string())
            .collect();
        assert_eq!(listed, vec!["Wifi", "Sauna", "Parking"]);
    }

    #[test]
    fn delete_is_idempotent() {
        let repo = InMemoryRepository::<Amenity>::new();
        let amenity = repo.add(Amenity::new("Wifi").unwrap()).unwrap();

        assert!(repo.delete(amenity.id()).unwrap());
        assert!(!repo.delete(amenity.id()).unwrap());
        assert!(repo.get(amenity.id()).unwrap().is_none());
        assert!(repo.is_empty().unwrap());
    }

    #[test]
    fn unique_email_is_enforced_on_add_and_update() {
        let repo = InMemoryRepository::<User>::new();
        repo.add(user("ada@example.com")).unwrap();
        let grace = repo.add(user("grace@example.com")).unwrap();

        let err = repo.add(user("ADA@example.com")).unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));

        let err = repo
            .update(
                grace.id(),
                &UserPatch {
                    email: Some("ada@example.com".to_string()),
                    ..UserPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));

        let unchanged = repo
            .update(
                grace.id(),
                &UserPatch {
                    email: Some("grace@example.com".to_string()),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        assert!(unchanged.is_some());
    }

    #[test]
    fn update_of_missing_id_returns_none() {
        let repo = InMemoryRepository::<Amenity>::new();
        let missing = Amenity::new("Ghost").unwrap();
        let result = repo
            .update(missing.id(), &AmenityPatch::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn lookup_by_attribute_returns_first_match() {
        let repo = InMemoryRepository::<Amenity>::new();
        let first = repo.add(Amenity::new("Wifi").unwrap()).unwrap();
        repo.add(Amenity::new("Wifi").unwrap()).unwrap();

        let found = repo
            .get_by_attribute("name", &AttributeValue::from("Wifi"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), first.id());

        let all = repo
            .find_by_attribute("name", &AttributeValue::from("Wifi"))
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
