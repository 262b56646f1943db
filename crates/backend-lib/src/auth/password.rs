// ============================
// luxe-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use std::sync::Arc;

use scrypt::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Params, Scrypt,
};
use thiserror::Error;
use zeroize::Zeroize;

use super::token_generator::generate_secure_token;

const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const SCRYPT_OUTPUT_LEN: usize = 32;

/// Password hashing failures
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid scrypt parameters: {0}")]
    Params(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Salted scrypt hasher with a fixed cost.
///
/// Hash output embeds its salt and parameters (PHC string format), so
/// hashing the same password twice yields different strings while
/// verification stays deterministic.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Verified against when an account has no usable hash, so a failed
    /// login costs the same whether or not the email exists.
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("log_n", &self.params.log_n())
            .finish()
    }
}

impl PasswordHasher {
    /// Create a hasher with cost `2^log_n`
    pub fn new(log_n: u8) -> Result<Self, PasswordError> {
        let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, SCRYPT_OUTPUT_LEN)
            .map_err(|e| PasswordError::Params(e.to_string()))?;
        let dummy_hash = hash_with(params, &generate_secure_token())?;
        Ok(Self {
            params,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        hash_with(self.params, plain)
    }

    /// Verify a password against a stored hash. A malformed hash never matches.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// Verify against an optional hash, spending the same work when it is absent
    pub fn verify_or_dummy(&self, plain: &str, hash: Option<&str>) -> bool {
        match hash {
            Some(hash) => self.verify(plain, hash),
            None => {
                let _ = self.verify(plain, &self.dummy_hash);
                false
            },
        }
    }

    /// Hash on the blocking pool and zeroize the plaintext afterwards
    pub async fn hash_owned(&self, mut plain: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        on_blocking_pool(move || {
            let hash = hasher.hash(&plain);
            plain.zeroize();
            hash
        })
        .await?
    }

    /// Verify on the blocking pool and zeroize the plaintext afterwards
    pub async fn verify_owned(
        &self,
        mut plain: String,
        hash: Option<String>,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        on_blocking_pool(move || {
            let ok = hasher.verify_or_dummy(&plain, hash.as_deref());
            plain.zeroize();
            ok
        })
        .await
    }

    /// Hash of a random secret that is discarded immediately.
    /// Stored for accounts that must never accept a password login.
    pub async fn unusable_hash(&self) -> Result<String, PasswordError> {
        self.hash_owned(generate_secure_token()).await
    }
}

/// Run CPU-bound work off the async executor; a panicked or cancelled task is an error
async fn on_blocking_pool<T, F>(work: F) -> Result<T, PasswordError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn hash_with(params: Params, plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();
    Ok(hash)
}
