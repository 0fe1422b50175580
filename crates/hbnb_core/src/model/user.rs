//! User account model.
//!
//! # Invariants
//! - `first_name`/`last_name` are non-blank and at most 50 characters.
//! - `email` is stored trimmed and lowercased.
//! - `password_hash` is opaque, never blank, and never serialized.

use crate::model::base::{AttributeValue, Entity, EntityId, EntityKind, RecordMeta};
use crate::model::validation::{self, ValidationError, NAME_MAX_CHARS};
use serde::Serialize;

/// Registered catalog user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(flatten)]
    pub(crate) meta: RecordMeta,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    #[serde(skip_serializing)]
    pub(crate) password_hash: String,
    pub(crate) is_admin: bool,
}

/// Input for registering a user. `password` is plaintext and is hashed by
/// the facade before a `User` is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Partial update for a stored user. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

impl User {
    /// Builds a validated user from registration input and a password hash.
    pub fn new(input: &NewUser, password_hash: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            meta: RecordMeta::new(),
            first_name: validate_first_name(&input.first_name)?,
            last_name: validate_last_name(&input.last_name)?,
            email: validation::email(&input.email)?,
            password_hash: validation::password_hash(&password_hash.into())?,
            is_admin: input.is_admin,
        })
    }

    /// Checks registration fields, including the plaintext password, without
    /// building a user. Returns the normalized email.
    pub fn validate_new(input: &NewUser) -> Result<String, ValidationError> {
        validate_first_name(&input.first_name)?;
        validate_last_name(&input.last_name)?;
        let email = validation::email(&input.email)?;
        validation::password(&input.password)?;
        Ok(email)
    }

    /// Applies the present fields of `patch` after validating all of them.
    pub fn update(&mut self, patch: &UserPatch) -> Result<(), ValidationError> {
        let first_name = patch
            .first_name
            .as_deref()
            .map(validate_first_name)
            .transpose()?;
        let last_name = patch
            .last_name
            .as_deref()
            .map(validate_last_name)
            .transpose()?;
        let email = patch.email.as_deref().map(validation::email).transpose()?;
        let password_hash = patch
            .password_hash
            .as_deref()
            .map(validation::password_hash)
            .transpose()?;

        if let Some(value) = first_name {
            self.first_name = value;
        }
        if let Some(value) = last_name {
            self.last_name = value;
        }
        if let Some(value) = email {
            self.email = value;
        }
        if let Some(value) = password_hash {
            self.password_hash = value;
        }
        if let Some(value) = patch.is_admin {
            self.is_admin = value;
        }
        self.meta.touch();
        Ok(())
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn id(&self) -> EntityId {
        self.meta.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

fn validate_first_name(value: &str) -> Result<String, ValidationError> {
    validation::required_text("first_name", value, NAME_MAX_CHARS)
}

fn validate_last_name(value: &str) -> Result<String, ValidationError> {
    validation::required_text("last_name", value, NAME_MAX_CHARS)
}

impl Entity for User {
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;
    const ATTRIBUTES: &'static [&'static str] =
        &["id", "first_name", "last_name", "email", "is_admin"];
    const UNIQUE_ATTRIBUTES: &'static [&'static str] = &["email"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "id" => Some(AttributeValue::Id(self.meta.id)),
            "first_name" => Some(self.first_name.clone().into()),
            "last_name" => Some(self.last_name.clone().into()),
            "email" => Some(self.email.clone().into()),
            "is_admin" => Some(self.is_admin.into()),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &Self::Patch) -> Result<(), ValidationError> {
        self.update(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, User, UserPatch};
    use crate::model::validation::ValidationKind;

    fn jane() -> NewUser {
        NewUser {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "Jane@Example.com".to_string(),
            password: "secret".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn new_user_normalizes_email_and_hides_hash() {
        let user = User::new(&jane(), "opaque-hash").unwrap();
        assert_eq!(user.email(), "jane@example.com");
        assert!(!user.is_admin());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "jane@example.com");
        assert!(json.get("id").is_some());
        assert!(json.get("created_at").is_some());
    }

    #[test]
    fn failed_update_leaves_user_unchanged() {
        let mut user = User::new(&jane(), "opaque-hash").unwrap();
        let before = user.clone();

        let err = user
            .update(&UserPatch {
                first_name: Some("Janet".to_string()),
                last_name: Some("x".repeat(51)),
                ..UserPatch::default()
            })
            .unwrap_err();

        assert_eq!(err.field, "last_name");
        assert_eq!(err.kind, ValidationKind::TooLong);
        assert_eq!(user, before);
    }

    #[test]
    fn blank_password_hash_is_rejected() {
        let err = User::new(&jane(), "  ").unwrap_err();
        assert_eq!(err.field, "password_hash");
        assert_eq!(err.kind, ValidationKind::Required);
    }

    #[test]
    fn registration_input_is_checked_without_a_hash() {
        assert_eq!(User::validate_new(&jane()).unwrap(), "jane@example.com");

        let err = User::validate_new(&NewUser {
            first_name: "   ".to_string(),
            password: String::new(),
            ..jane()
        })
        .unwrap_err();
        assert_eq!(err.field, "first_name");
        assert_eq!(err.kind, ValidationKind::Required);

        let err = User::validate_new(&NewUser {
            password: String::new(),
            ..jane()
        })
        .unwrap_err();
        assert_eq!(err.field, "password");
    }
}
