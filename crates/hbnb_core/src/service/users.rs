//! User operations: registration, lookup, profile update, login check and
//! the user cascade.

use crate::model::validation;
use crate::model::{AttributeValue, EntityId, EntityKind, NewUser, User, UserPatch};
use crate::repo::CascadePlan;
use crate::service::error::{CatalogError, CatalogResult};
use crate::service::facade::{require, retry_transient, CatalogFacade};
use log::info;

/// Partial user update as supplied by callers. `password` is plaintext and is
/// re-hashed only when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

impl CatalogFacade {
    /// Registers a user after validating fields, checking email uniqueness
    /// and hashing the password, in that order.
    ///
    /// # Errors
    /// - `Validation` for any field rule, including the plaintext password.
    /// - `ConstraintViolation` when the normalized email is already registered.
    /// - `Hashing` when the hasher fails; only reached with valid input.
    pub fn create_user(&self, input: &NewUser) -> CatalogResult<User> {
        let _gate = self.shared_gate();
        let email = User::validate_new(input)?;
        self.ensure_email_free(&email, None)?;
        let password_hash = self.hash_password(&input.password)?;
        let user = User::new(input, password_hash)?;

        let stored = retry_transient("user_create", || self.repos.users.add(user.clone()))?;
        info!(
            "event=user_create module=service status=ok user_id={} is_admin={}",
            stored.id(),
            stored.is_admin()
        );
        Ok(stored)
    }

    pub fn get_user(&self, user_id: EntityId) -> CatalogResult<Option<User>> {
        let _gate = self.shared_gate();
        retry_transient("user_get", || self.repos.users.get(user_id))
    }

    /// Looks a user up by email, ignoring case and surrounding whitespace.
    pub fn get_user_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        let _gate = self.shared_gate();
        self.find_by_email(email)
    }

    pub fn get_all_users(&self) -> CatalogResult<Vec<User>> {
        let _gate = self.shared_gate();
        retry_transient("user_list", || self.repos.users.get_all())
    }

    /// Applies a partial profile update.
    ///
    /// Email uniqueness is re-checked only when the email actually changes;
    /// the password is re-hashed only when a new one is supplied.
    pub fn update_user(&self, user_id: EntityId, update: &UserUpdate) -> CatalogResult<User> {
        let _gate = self.shared_gate();
        if let Some(password) = &update.password {
            validation::password(password)?;
        }
        let current = require(self.repos.users.as_ref(), "user_update", user_id)?;

        let mut patch = UserPatch {
            first_name: update.first_name.clone(),
            last_name: update.last_name.clone(),
            email: update.email.clone(),
            password_hash: None,
            is_admin: update.is_admin,
        };
        let mut preview = current.clone();
        preview.update(&patch)?;
        if preview.email() != current.email() {
            self.ensure_email_free(preview.email(), Some(user_id))?;
        }

        if let Some(password) = &update.password {
            patch.password_hash = Some(self.hash_password(password)?);
        }
        let updated = retry_transient("user_update", || self.repos.users.update(user_id, &patch))?
            .ok_or(CatalogError::not_found(EntityKind::User, user_id))?;
        info!(
            "event=user_update module=service status=ok user_id={user_id} password_changed={}",
            update.password.is_some()
        );
        Ok(updated)
    }

    /// Deletes a user with every review they authored and every place they
    /// own (including the reviews on those places).
    ///
    /// Returns `false` when the user does not exist.
    pub fn delete_user(&self, user_id: EntityId) -> CatalogResult<bool> {
        let _gate = self.exclusive_gate();
        let Some(user) = retry_transient("user_delete", || self.repos.users.get(user_id))? else {
            return Ok(false);
        };

        let owner = AttributeValue::Id(user_id);
        let mut plan = CascadePlan::new();
        let authored = retry_transient("user_delete", || {
            self.repos.reviews.find_by_attribute("user_id", &owner)
        })?;
        for review in authored {
            plan.remove_review(review);
        }
        let owned = retry_transient("user_delete", || {
            self.repos.places.find_by_attribute("owner_id", &owner)
        })?;
        for place in owned {
            self.plan_place_removal(place, &mut plan, "user_delete")?;
        }
        plan.remove_user(user);

        self.apply_cascade(&plan, "user_delete")?;
        info!(
            "event=user_delete module=service status=ok user_id={user_id} places_removed={} reviews_removed={}",
            plan.places_removed(),
            plan.reviews_removed()
        );
        Ok(true)
    }

    /// Resolves login credentials to a user.
    ///
    /// Returns `None` for an unknown email or a wrong password; the two cases
    /// are not distinguished.
    pub fn authenticate(&self, email: &str, password: &str) -> CatalogResult<Option<User>> {
        let _gate = self.shared_gate();
        let Some(user) = self.find_by_email(email)? else {
            info!("event=user_authenticate module=service status=rejected");
            return Ok(None);
        };
        if self.hasher.verify(password, user.password_hash()) {
            info!(
                "event=user_authenticate module=service status=ok user_id={}",
                user.id()
            );
            Ok(Some(user))
        } else {
            info!("event=user_authenticate module=service status=rejected");
            Ok(None)
        }
    }

    fn find_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        let normalized = AttributeValue::Text(email.trim().to_lowercase());
        retry_transient("user_get_by_email", || {
            self.repos.users.get_by_attribute("email", &normalized)
        })
    }

    fn ensure_email_free(&self, email: &str, owner: Option<EntityId>) -> CatalogResult<()> {
        match self.find_by_email(email)? {
            Some(existing) if Some(existing.id()) != owner => Err(
                CatalogError::ConstraintViolation("email already registered".to_string()),
            ),
            _ => Ok(()),
        }
    }
}
