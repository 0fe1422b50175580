mod common;

use common::{hasher, new_place, new_review, new_user};
use hbnb_core::{
    Amenity, AttributeValue, CatalogError, CatalogFacade, CatalogRepositories, Entity, EntityId,
    InMemoryRepository, NewPlace, Place, RepoError, RepoResult, Repository, Review, SqliteStore,
    User,
};
use rusqlite::Connection;
use std::path::Path;

/// In-memory repository whose deletes always fail.
struct RefusingDeletes<E: Entity>(InMemoryRepository<E>);

impl<E: Entity> RefusingDeletes<E> {
    fn boxed() -> Box<Self> {
        Box::new(Self(InMemoryRepository::new()))
    }
}

impl<E: Entity> Repository<E> for RefusingDeletes<E> {
    fn add(&self, entity: E) -> RepoResult<E> {
        self.0.add(entity)
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<E>> {
        self.0.get(id)
    }

    fn get_all(&self) -> RepoResult<Vec<E>> {
        self.0.get_all()
    }

    fn get_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Option<E>> {
        self.0.get_by_attribute(name, value)
    }

    fn find_by_attribute(&self, name: &str, value: &AttributeValue) -> RepoResult<Vec<E>> {
        self.0.find_by_attribute(name, value)
    }

    fn update(&self, id: EntityId, patch: &E::Patch) -> RepoResult<Option<E>> {
        self.0.update(id, patch)
    }

    fn delete(&self, _id: EntityId) -> RepoResult<bool> {
        Err(RepoError::Constraint("removal refused".to_string()))
    }
}

fn memory_facade_refusing_place_deletes() -> CatalogFacade {
    let repos = CatalogRepositories {
        users: Box::new(InMemoryRepository::<User>::new()),
        amenities: Box::new(InMemoryRepository::<Amenity>::new()),
        places: RefusingDeletes::<Place>::boxed(),
        reviews: Box::new(InMemoryRepository::<Review>::new()),
        shared_store: None,
    };
    CatalogFacade::new(repos, hasher())
}

fn memory_facade_refusing_amenity_deletes() -> CatalogFacade {
    let repos = CatalogRepositories {
        users: Box::new(InMemoryRepository::<User>::new()),
        amenities: RefusingDeletes::<Amenity>::boxed(),
        places: Box::new(InMemoryRepository::<Place>::new()),
        reviews: Box::new(InMemoryRepository::<Review>::new()),
        shared_store: None,
    };
    CatalogFacade::new(repos, hasher())
}

fn sqlite_facade_at(path: &Path) -> CatalogFacade {
    let store = SqliteStore::open(path).unwrap();
    CatalogFacade::new(CatalogRepositories::sqlite(&store), hasher())
}

/// Installs a trigger from a second connection that aborts every delete on `table`.
fn refuse_deletes_on(path: &Path, table: &str) {
    let side = Connection::open(path).unwrap();
    side.execute_batch(&format!(
        "CREATE TRIGGER refuse_{table}_delete BEFORE DELETE ON {table}
         BEGIN SELECT RAISE(ABORT, 'removal refused'); END;"
    ))
    .unwrap();
}

fn allow_deletes_on(path: &Path, table: &str) {
    let side = Connection::open(path).unwrap();
    side.execute_batch(&format!("DROP TRIGGER refuse_{table}_delete;"))
        .unwrap();
}

struct HostedCatalog {
    host: User,
    owned: Place,
    guest_place: Place,
    on_owned: Review,
    authored: Review,
}

/// The host owns one place reviewed by a guest and reviewed the guest's place.
fn hosted_catalog(facade: &CatalogFacade) -> HostedCatalog {
    let host = facade.create_user(&new_user("host@example.com")).unwrap();
    let guest = facade.create_user(&new_user("guest@example.com")).unwrap();
    let owned = facade.create_place(&new_place(host.id())).unwrap();
    let guest_place = facade.create_place(&new_place(guest.id())).unwrap();
    let on_owned = facade
        .create_review(&new_review(guest.id(), owned.id(), 5))
        .unwrap();
    let authored = facade
        .create_review(&new_review(host.id(), guest_place.id(), 3))
        .unwrap();
    HostedCatalog {
        host,
        owned,
        guest_place,
        on_owned,
        authored,
    }
}

fn assert_catalog_intact(facade: &CatalogFacade, catalog: &HostedCatalog, backend: &str) {
    assert_eq!(
        facade.get_user(catalog.host.id()).unwrap().as_ref(),
        Some(&catalog.host),
        "{backend}"
    );
    assert!(facade.get_place(catalog.owned.id()).unwrap().is_some(), "{backend}");
    assert!(facade.get_place(catalog.guest_place.id()).unwrap().is_some(), "{backend}");
    assert_eq!(
        facade.get_review(catalog.on_owned.id()).unwrap().as_ref(),
        Some(&catalog.on_owned),
        "{backend}"
    );
    assert_eq!(
        facade.get_review(catalog.authored.id()).unwrap().as_ref(),
        Some(&catalog.authored),
        "{backend}"
    );
    assert_eq!(facade.get_all_reviews().unwrap().len(), 2, "{backend}");
}

#[test]
fn failed_user_cascade_leaves_everything_in_place_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let facade = sqlite_facade_at(&path);
    let catalog = hosted_catalog(&facade);

    refuse_deletes_on(&path, "places");
    let err = facade.delete_user(catalog.host.id()).unwrap_err();
    assert!(matches!(err, CatalogError::ConstraintViolation(_)), "{err}");
    assert_catalog_intact(&facade, &catalog, "sqlite");

    allow_deletes_on(&path, "places");
    assert!(facade.delete_user(catalog.host.id()).unwrap());
    assert!(facade.get_review(catalog.authored.id()).unwrap().is_none());
    assert!(facade.get_place(catalog.owned.id()).unwrap().is_none());
}

#[test]
fn failed_user_cascade_leaves_everything_in_place_in_memory() {
    let facade = memory_facade_refusing_place_deletes();
    let catalog = hosted_catalog(&facade);

    let err = facade.delete_user(catalog.host.id()).unwrap_err();
    assert!(matches!(err, CatalogError::ConstraintViolation(_)), "{err}");
    assert_catalog_intact(&facade, &catalog, "memory");
    assert_eq!(
        facade.get_reviews_by_place(catalog.owned.id()).unwrap(),
        vec![catalog.on_owned.clone()]
    );
}

#[test]
fn failed_place_cascade_keeps_its_reviews() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let sqlite = sqlite_facade_at(&path);
    let sqlite_catalog = hosted_catalog(&sqlite);
    refuse_deletes_on(&path, "places");

    let memory = memory_facade_refusing_place_deletes();
    let memory_catalog = hosted_catalog(&memory);

    for (backend, facade, catalog) in [
        ("sqlite", &sqlite, &sqlite_catalog),
        ("memory", &memory, &memory_catalog),
    ] {
        assert!(facade.delete_place(catalog.owned.id()).is_err(), "{backend}");
        assert_catalog_intact(facade, catalog, backend);
    }
}

#[test]
fn failed_amenity_cascade_keeps_place_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let sqlite = sqlite_facade_at(&path);
    refuse_deletes_on(&path, "amenities");
    let memory = memory_facade_refusing_amenity_deletes();

    for (backend, facade) in [("sqlite", &sqlite), ("memory", &memory)] {
        let host = facade.create_user(&new_user("host@example.com")).unwrap();
        let wifi = facade.create_amenity("Wifi").unwrap();
        let pool = facade.create_amenity("Pool").unwrap();
        let place = facade
            .create_place(&NewPlace {
                amenities: vec![wifi.id(), pool.id()],
                ..new_place(host.id())
            })
            .unwrap();

        assert!(facade.delete_amenity(wifi.id()).is_err(), "{backend}");

        let stored = facade.get_place(place.id()).unwrap().unwrap();
        assert!(stored.has_amenity(wifi.id()), "{backend}");
        assert!(stored.has_amenity(pool.id()), "{backend}");
        assert!(facade.get_amenity(wifi.id()).unwrap().is_some(), "{backend}");
    }
}
