//! Salted Argon2id hashing of account secrets
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so the
//! salt and cost parameters travel with the hash and verification re-derives
//! with exactly what was used at hashing time.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::error::{AuthError, Result};

/// Input hashed once at construction to equalise the cost of unknown-identity lookups
const DUMMY_SECRET: &str = "portfolio-auth-dummy-secret";

/// Argon2id hasher holding the cost parameters for new hashes
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl SecretHasher {
    /// Create a hasher with the argon2 crate's recommended parameters
    pub fn new() -> Result<Self> {
        Self::from_argon2(Argon2::default())
    }

    /// Create a hasher with custom cost parameters (memory in KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::Config(format!("Invalid Argon2 parameters: {}", e)))?;
        Self::from_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn from_argon2(argon2: Argon2<'static>) -> Result<Self> {
        let dummy_hash = hash_with(&argon2, DUMMY_SECRET)?;
        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String> {
        hash_with(&self.argon2, secret)
    }

    /// Check a candidate secret against a stored PHC hash.
    /// Unparseable hashes never match.
    pub fn verify(&self, candidate: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(h) => h,
            Err(e) => {
                log::error!("Stored credential hash is not a valid PHC string: {}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one derivation without matching anything
    pub fn verify_dummy(&self, candidate: &str) -> bool {
        let _ = self.verify(candidate, &self.dummy_hash);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2.hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
