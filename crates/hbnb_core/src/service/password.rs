//! Password hashing collaborator.
//!
//! The catalog only ever stores and compares the opaque hash string.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PasswordError(String);

impl PasswordError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Hash/verify pair injected into the facade.
pub trait PasswordHasher: Send + Sync {
    /// Produces an opaque hash for `plaintext`.
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// Returns `true` when `plaintext` matches `hashed`. Malformed hashes never match.
    fn verify(&self, plaintext: &str, hashed: &str) -> bool;
}

/// Argon2id hasher emitting PHC strings.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2PasswordHasher {
    /// Custom cost parameters (memory KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| PasswordError::new(format!("invalid argon2 params: {err}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordError::new(format!("argon2 hashing failed: {err}")))
    }

    fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2PasswordHasher, PasswordHasher};

    fn cheap() -> Argon2PasswordHasher {
        Argon2PasswordHasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_is_salted_phc_string_and_verifies() {
        let hasher = cheap();
        let first = hasher.hash("s3cret").unwrap();
        let second = hasher.hash("s3cret").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(hasher.verify("s3cret", &first));
        assert!(!hasher.verify("wrong", &first));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!cheap().verify("s3cret", "not-a-phc-string"));
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(Argon2PasswordHasher::with_params(0, 0, 0).is_err());
    }
}
