mod common;

use common::{hasher, new_place, new_review, new_user};
use hbnb_core::{
    AttributeValue, CatalogConfig, CatalogError, CatalogFacade, NewPlace, Place, RepoError,
    Repository, SqliteStore, StorageBackend, User, UserPatch,
};

#[test]
fn catalog_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = CatalogConfig {
        storage: StorageBackend::Sqlite {
            path: dir.path().join("catalog.db"),
        },
        ..CatalogConfig::default()
    };

    let (user, place, review) = {
        let facade = CatalogFacade::from_config(&config, hasher()).unwrap();
        let user = facade.create_user(&new_user("ada@example.com")).unwrap();
        let wifi = facade.create_amenity("Wifi").unwrap();
        let place = facade
            .create_place(&NewPlace {
                amenities: vec![wifi.id()],
                ..new_place(user.id())
            })
            .unwrap();
        let review = facade
            .create_review(&new_review(user.id(), place.id(), 5))
            .unwrap();
        (user, place, review)
    };

    let facade = CatalogFacade::from_config(&config, hasher()).unwrap();
    assert_eq!(facade.get_user(user.id()).unwrap().unwrap(), user);
    assert_eq!(facade.get_place(place.id()).unwrap().unwrap(), place);
    assert_eq!(
        facade.get_reviews_by_place(place.id()).unwrap(),
        vec![review]
    );
    assert!(facade
        .authenticate("ada@example.com", "correct horse")
        .unwrap()
        .is_some());
}

#[test]
fn unique_email_is_enforced_by_the_table_as_well() {
    let store = SqliteStore::open_in_memory().unwrap();
    let users = store.repository::<User>();
    let input = new_user("ada@example.com");
    users.add(User::new(&input, "hash-one").unwrap()).unwrap();

    let err = users
        .add(User::new(&input, "hash-two").unwrap())
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));
    assert!(matches!(CatalogError::from(err), CatalogError::ConstraintViolation(_)));
}

#[test]
fn update_writes_only_through_validation() {
    let store = SqliteStore::open_in_memory().unwrap();
    let users = store.repository::<User>();
    let user = users
        .add(User::new(&new_user("ada@example.com"), "hash").unwrap())
        .unwrap();

    let err = users
        .update(
            user.id(),
            &UserPatch {
                email: Some("broken".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(users.get(user.id()).unwrap().unwrap(), user);
}

#[test]
fn attribute_lookups_match_memory_semantics() {
    let store = SqliteStore::open_in_memory().unwrap();
    let users = store.repository::<User>();
    let places = store.repository::<Place>();
    let owner = users
        .add(User::new(&new_user("ada@example.com"), "hash").unwrap())
        .unwrap();
    let first = places.add(Place::new(&new_place(owner.id())).unwrap()).unwrap();
    let second = places.add(Place::new(&new_place(owner.id())).unwrap()).unwrap();

    let owned = places
        .find_by_attribute("owner_id", &AttributeValue::Id(owner.id()))
        .unwrap();
    assert_eq!(owned, vec![first.clone(), second]);

    let found = places
        .get_by_attribute("price", &AttributeValue::Real(95.0))
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), first.id());

    let err = places
        .get_by_attribute("owner_id; DROP TABLE places", &AttributeValue::Id(owner.id()))
        .unwrap_err();
    assert!(matches!(err, RepoError::UnknownAttribute { .. }));

    let admin = users
        .get_by_attribute("is_admin", &AttributeValue::Bool(false))
        .unwrap();
    assert_eq!(admin.map(|user| user.id()), Some(owner.id()));
}
