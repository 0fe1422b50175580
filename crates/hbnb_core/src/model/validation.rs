//! Field validators shared by entity constructors and partial updates.
//!
//! # Responsibility
//! - Implement every field rule exactly once.
//! - Attribute each failure to one field and one rule.
//!
//! # Invariants
//! - Create and update paths call the same validator for the same field.
//! - Text is trimmed before length checks; lengths count characters.

use crate::model::base::EntityId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const NAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 120;
pub const PASSWORD_MAX_CHARS: usize = 128;
pub const TITLE_MAX_CHARS: usize = 100;
pub const LONG_TEXT_MAX_CHARS: usize = 1000;
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Rule broken by a rejected field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationKind {
    Required,
    TooLong,
    OutOfRange,
    Malformed,
    Duplicate,
}

impl ValidationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooLong => "too-long",
            Self::OutOfRange => "out-of-range",
            Self::Malformed => "malformed",
            Self::Duplicate => "duplicate",
        }
    }
}

impl Display for ValidationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field failed a single rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}` ({kind}): {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub kind: ValidationKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, ValidationKind::Required, "value is required")
    }

    pub fn too_long(field: &'static str, max_chars: usize) -> Self {
        Self::new(
            field,
            ValidationKind::TooLong,
            format!("must be at most {max_chars} characters"),
        )
    }

    pub fn out_of_range(field: &'static str, min: impl Display, max: impl Display) -> Self {
        Self::new(
            field,
            ValidationKind::OutOfRange,
            format!("must be between {min} and {max}"),
        )
    }

    pub fn malformed(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, ValidationKind::Malformed, message)
    }
}

/// Trims `value` and enforces non-blank plus a character ceiling.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    bounded_text(field, trimmed, max_chars)
}

/// Trims `value` and enforces a character ceiling; blank is allowed.
pub fn bounded_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::too_long(field, max_chars));
    }
    Ok(trimmed.to_string())
}

/// Normalizes an email to trimmed lowercase and checks address syntax.
pub fn email(value: &str) -> Result<String, ValidationError> {
    let normalized = required_text("email", value, EMAIL_MAX_CHARS)?.to_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(ValidationError::malformed(
            "email",
            "must be a valid email address",
        ));
    }
    Ok(normalized)
}

/// Plaintext password rule, checked before hashing on create and update.
pub fn password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if value.chars().count() > PASSWORD_MAX_CHARS {
        return Err(ValidationError::too_long("password", PASSWORD_MAX_CHARS));
    }
    Ok(())
}

/// Stored password hashes are opaque but never blank.
pub fn password_hash(value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required("password_hash"));
    }
    Ok(value.to_string())
}

/// Inclusive range check for finite floating point values.
pub fn ranged_f64(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::malformed(field, "must be a finite number"));
    }
    if value < min || value > max {
        return Err(ValidationError::out_of_range(field, min, max));
    }
    Ok(value)
}

pub fn price(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::malformed("price", "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::new(
            "price",
            ValidationKind::OutOfRange,
            "must be greater than or equal to 0",
        ));
    }
    Ok(value)
}

pub fn latitude(value: f64) -> Result<f64, ValidationError> {
    ranged_f64("latitude", value, -90.0, 90.0)
}

pub fn longitude(value: f64) -> Result<f64, ValidationError> {
    ranged_f64("longitude", value, -180.0, 180.0)
}

pub fn rating(value: i32) -> Result<i32, ValidationError> {
    if !(RATING_MIN..=RATING_MAX).contains(&value) {
        return Err(ValidationError::out_of_range("rating", RATING_MIN, RATING_MAX));
    }
    Ok(value)
}

/// Rejects repeated identifiers and returns the set in canonical (sorted) order.
pub fn id_set(field: &'static str, ids: &[EntityId]) -> Result<Vec<EntityId>, ValidationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(*id) {
            return Err(ValidationError::new(
                field,
                ValidationKind::Duplicate,
                format!("identifier {id} listed more than once"),
            ));
        }
    }
    Ok(seen.into_iter().collect())
}
