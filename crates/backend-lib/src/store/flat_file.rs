// ============================
// luxe-backend-lib/src/store/flat_file.rs
// ============================
//! Flat-file user store.
//!
//! Layout under the root directory:
//!
//! ```text
//! users/<id>.json               one record per account
//! users/by-email/<sha256(email)> id of the account owning that email
//! ```
//!
//! An index entry is staged under a dot-name with its id already written,
//! then hard-linked onto its final name. The link fails with
//! `AlreadyExists` when the email is taken, so a visible entry always
//! carries an id.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use luxe_common::UserId;
use sha2::{Digest, Sha256};
use tokio::{fs as tokio_fs, io::AsyncWriteExt};
use uuid::Uuid;

use super::{normalize_email, NewUser, StoreError, UserRecord, UserStore};

/// Flat-file implementation of the UserStore trait
#[derive(Clone, Debug)]
pub struct FlatFileUserStore {
    root: PathBuf,
}

impl FlatFileUserStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("users").join("by-email"))?;
        Ok(Self { root })
    }

    fn user_path(&self, id: UserId) -> PathBuf {
        self.root.join("users").join(format!("{id}.json"))
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join("users").join("by-email")
    }

    fn index_path(&self, email: &str) -> PathBuf {
        let digest = Sha256::digest(normalize_email(email).as_bytes());
        self.index_dir().join(format!("{digest:x}"))
    }

    async fn read_record(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        match tokio_fs::read(self.user_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `bytes` to `path` and flush it to disk
    async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = tokio_fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Write the record next to its final path, then rename over it
    async fn write_record(&self, record: &UserRecord) -> Result<(), StoreError> {
        let path = self.user_path(record.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record)?;

        Self::write_synced(&tmp, &json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Record an index entry points at. An absent, empty, unparsable or
    /// dangling entry resolves to `None`.
    async fn resolve_entry(&self, entry: &Path) -> Result<Option<UserRecord>, StoreError> {
        let raw = match tokio_fs::read_to_string(entry).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => self.read_record(id).await,
            Err(_) => Ok(None),
        }
    }

    /// Atomically claim `email` for `id`. Returns false when already taken.
    async fn claim_email(&self, email: &str, id: UserId) -> Result<bool, StoreError> {
        let staged = self.index_dir().join(format!(".{id}.claim"));
        Self::write_synced(&staged, id.to_string().as_bytes()).await?;

        let claimed = self.link_entry(&staged, &self.index_path(email)).await;
        let _ = tokio_fs::remove_file(&staged).await;
        claimed
    }

    async fn link_entry(&self, staged: &Path, entry: &Path) -> Result<bool, StoreError> {
        // one retry after clearing a stale entry
        for _ in 0..2 {
            match tokio_fs::hard_link(staged, entry).await {
                Ok(()) => return Ok(true),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !self.evict_stale_entry(entry).await? {
                        return Ok(false);
                    }
                },
                Err(e) => return Err(e.into()),
            }
        }
        Ok(false)
    }

    /// Remove an index entry that points at no record, e.g. one left by a
    /// crash in an older layout. Returns whether the entry is gone.
    async fn evict_stale_entry(&self, entry: &Path) -> Result<bool, StoreError> {
        if self.resolve_entry(entry).await?.is_some() {
            return Ok(false);
        }

        // move it aside first so a claim landing meanwhile is not deleted
        let aside = entry.with_extension(format!("stale-{}", Uuid::new_v4()));
        match tokio_fs::rename(entry, &aside).await {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        }

        if self.resolve_entry(&aside).await?.is_some() {
            let _ = tokio_fs::hard_link(&aside, entry).await;
            let _ = tokio_fs::remove_file(&aside).await;
            return Ok(false);
        }

        tokio_fs::remove_file(&aside).await?;
        tracing::warn!(entry = %entry.display(), "removed stale email index entry");
        Ok(true)
    }
}

fn is_index_entry(name: &str) -> bool {
    !name.contains('.')
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.resolve_entry(&self.index_path(email)).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.read_record(id).await
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = user.into_record();

        // the record exists before the email points at it
        self.write_record(&record).await?;

        match self.claim_email(&record.email, record.id).await {
            Ok(true) => {
                tracing::debug!(user_id = %record.id, "user record written");
                Ok(record)
            },
            Ok(false) => {
                let _ = tokio_fs::remove_file(self.user_path(record.id)).await;
                Err(StoreError::Duplicate(record.email))
            },
            Err(e) => {
                let _ = tokio_fs::remove_file(self.user_path(record.id)).await;
                Err(e)
            },
        }
    }

    /// Counts claimed emails, so a record orphaned by a lost race is not counted
    async fn count(&self) -> Result<usize, StoreError> {
        let mut entries = tokio_fs::read_dir(self.index_dir()).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if entry.file_type().await?.is_file() && is_index_entry(&name.to_string_lossy()) {
                count += 1;
            }
        }
        Ok(count)
    }
}
