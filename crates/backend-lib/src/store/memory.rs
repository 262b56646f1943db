// ============================
// luxe-backend-lib/src/store/memory.rs
// ============================
//! In-memory user store, used by tests and ephemeral deployments.
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use luxe_common::UserId;

use super::{normalize_email, NewUser, StoreError, UserRecord, UserStore};

/// Concurrent in-memory store keyed by id with a unique email index
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<UserId, UserRecord>>,
    by_email: Arc<DashMap<String, UserId>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let id = match self.by_email.get(&normalize_email(email)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = user.into_record();
        // the shard lock on the email entry serialises competing inserts
        match self.by_email.entry(record.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(record.email)),
            Entry::Vacant(slot) => {
                self.users.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(record)
            },
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.len())
    }
}
