#![allow(dead_code)]

use hbnb_core::{
    Argon2PasswordHasher, CatalogFacade, CatalogRepositories, EntityId, NewPlace, NewReview,
    NewUser, SqliteStore,
};

pub fn hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::with_params(8, 1, 1).unwrap()
}

pub fn memory_facade() -> CatalogFacade {
    CatalogFacade::in_memory(hasher())
}

pub fn sqlite_facade() -> CatalogFacade {
    let store = SqliteStore::open_in_memory().unwrap();
    CatalogFacade::new(CatalogRepositories::sqlite(&store), hasher())
}

/// Runs `check` once against each storage backend.
pub fn for_each_backend(check: impl Fn(&str, CatalogFacade)) {
    check("memory", memory_facade());
    check("sqlite", sqlite_facade());
}

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
        is_admin: false,
    }
}

pub fn new_place(owner_id: EntityId) -> NewPlace {
    NewPlace {
        title: "Harbour loft".to_string(),
        description: "Two rooms above the quay".to_string(),
        price: 95.0,
        latitude: 43.29,
        longitude: 5.37,
        owner_id,
        amenities: Vec::new(),
    }
}

pub fn new_review(user_id: EntityId, place_id: EntityId, rating: i32) -> NewReview {
    NewReview {
        text: "Quiet and bright".to_string(),
        rating,
        user_id,
        place_id,
    }
}
