use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::HashSettings;
use crate::errors::InternalError;

/// Outcome of comparing a password against a stored hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordVerification {
    Match,
    Mismatch,
    /// The stored value is not a parseable PHC string
    Malformed(String),
}

/// Cryptographic operations provider
///
/// Argon2id with the application pepper as the secret parameter. Hashing and
/// verification run on the blocking thread pool.
#[derive(Clone)]
pub struct CryptoProvider {
    pepper: Arc<String>,
    hash: HashSettings,
}

impl CryptoProvider {
    pub fn new(pepper: impl Into<String>, hash: HashSettings) -> Self {
        Self {
            pepper: Arc::new(pepper.into()),
            hash,
        }
    }

    /// Hash a password into a PHC string
    pub async fn hash_password(&self, password: &str) -> Result<String, InternalError> {
        let pepper = Arc::clone(&self.pepper);
        let hash = self.hash;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let argon2 = build_argon2(&pepper, hash)?;

            let mut salt_bytes = [0u8; 16];
            rand::rng().fill(&mut salt_bytes[..]);
            let salt = SaltString::encode_b64(&salt_bytes)
                .map_err(|e| InternalError::crypto("salt_generation", e.to_string()))?;

            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| InternalError::crypto("password_hash", e.to_string()))
        })
        .await
        .map_err(|e| InternalError::crypto("password_hash", e.to_string()))?
    }

    /// Compare a password with a stored hash
    ///
    /// Cost parameters are read from the stored hash, so hashes made with
    /// older settings still verify.
    pub async fn verify_password(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<PasswordVerification, InternalError> {
        let pepper = Arc::clone(&self.pepper);
        let hash = self.hash;
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&stored_hash) {
                Ok(parsed) => parsed,
                Err(e) => return Ok(PasswordVerification::Malformed(e.to_string())),
            };

            let argon2 = build_argon2(&pepper, hash)?;
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(PasswordVerification::Match),
                Err(argon2::password_hash::Error::Password) => Ok(PasswordVerification::Mismatch),
                Err(e) => Ok(PasswordVerification::Malformed(e.to_string())),
            }
        })
        .await
        .map_err(|e| InternalError::crypto("password_verify", e.to_string()))?
    }

    /// Generate a 20-character random password containing every character class
    ///
    /// Used for bootstrap accounts, so it has to pass any reasonable policy.
    pub fn generate_secure_password(&self) -> String {
        const PASSWORD_LENGTH: usize = 20;
        const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        const DIGITS: &[u8] = b"0123456789";
        const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

        let mut rng = rand::rng();
        let all: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();

        let mut chars: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS]
            .iter()
            .map(|class| class[rng.random_range(0..class.len())])
            .collect();
        while chars.len() < PASSWORD_LENGTH {
            chars.push(all[rng.random_range(0..all.len())]);
        }
        chars.shuffle(&mut rng);

        chars.into_iter().map(char::from).collect()
    }
}

impl std::fmt::Debug for CryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoProvider")
            .field("pepper", &"<redacted>")
            .field("hash", &self.hash)
            .finish()
    }
}

fn build_argon2(pepper: &str, hash: HashSettings) -> Result<Argon2<'_>, InternalError> {
    let params = Params::new(hash.memory_kib, hash.cost, 1, None)
        .map_err(|e| InternalError::crypto("argon2_params", e.to_string()))?;

    Argon2::new_with_secret(pepper.as_bytes(), Algorithm::Argon2id, Version::V0x13, params)
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
}
