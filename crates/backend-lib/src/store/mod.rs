// ============================
// luxe-backend-lib/src/store/mod.rs
// ============================
//! User account storage.
//!
//! The [`UserStore`] trait is the only thing the auth layer talks to.
//! Implementations must make `insert` atomic with respect to the email
//! uniqueness check: of two concurrent inserts for one email, exactly one
//! succeeds.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use luxe_common::{PublicUser, UserId, UserRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod flat_file;
mod memory;

pub use flat_file::FlatFileUserStore;
pub use memory::MemoryUserStore;
pub use crate::validation::normalize_email;

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another account already owns this email
    #[error("email already registered: {0}")]
    Duplicate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// A persisted user account, including its password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    /// Normalised (trimmed, lower-case) email
    pub email: String,
    /// PHC-format scrypt hash. Federated accounts hold the hash of a
    /// discarded random secret.
    pub password_hash: Option<String>,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view without the password hash
    pub fn to_public(&self) -> PublicUser {
        self.clone().into_public()
    }

    pub fn into_public(self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            google_id: self.google_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for [`UserStore::insert`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub google_id: Option<String>,
}

impl NewUser {
    /// Assign an id and timestamps. The email is normalised here so every
    /// store keys on the same form.
    pub fn into_record(self) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            name: self.name,
            email: normalize_email(&self.email),
            password_hash: self.password_hash,
            role: self.role,
            google_id: self.google_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trait for user storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by email. The email is normalised before lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up an account by id
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Create an account. Fails with [`StoreError::Duplicate`] when the
    /// email is taken, including by a concurrent insert.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Number of stored accounts
    async fn count(&self) -> Result<usize, StoreError>;
}
