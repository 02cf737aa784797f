//! Flat-file token storage
//!
//! Single-tenant / server-to-server backend: each field lives in its own
//! named file inside a working directory. Field writes go through a
//! temp-file + rename so a reader never sees a half-written value, token
//! record reads and writes share an in-process lock so a reader never sees
//! fields from two different records, and the record only counts as present
//! once every token file exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::TokenStore;
use crate::error::StoreError;
use crate::types::TokenSet;

const FILE_ACCESS_TOKEN: &str = "access_token";
const FILE_TOKEN_TYPE: &str = "token_type";
const FILE_REFRESH_TOKEN: &str = "refresh_token";
// Holds the absolute RFC3339 expiry instant. The key keeps the wire field's
// name even though the stored value is the derived instant, for layout
// compatibility with existing working directories.
const FILE_EXPIRES_IN: &str = "expires_in";
const FILE_SCOPE: &str = "scope";
const FILE_STATE: &str = "state";
const FILE_CODE: &str = "code";

const TOKEN_FILES: [&str; 5] =
    [FILE_ACCESS_TOKEN, FILE_TOKEN_TYPE, FILE_REFRESH_TOKEN, FILE_EXPIRES_IN, FILE_SCOPE];

/// [`TokenStore`] backend persisting each field as a named file.
#[derive(Debug, Clone)]
pub struct FlatFileTokenStore {
    dir: PathBuf,
    // The token record spans five files, so readers and writers share one
    // lock within this process. Cross-process concurrency is
    // last-write-wins per record.
    record_lock: Arc<RwLock<()>>,
}

impl FlatFileTokenStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, record_lock: Arc::new(RwLock::new(())) })
    }

    /// The working directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_field(&self, name: &str) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(self.dir.join(name)).await {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_field(&self, name: &str, value: &str) -> Result<(), StoreError> {
        // Unique temp name, so concurrent writes to the same field never
        // race on the rename source.
        let tmp = self.dir.join(format!("{name}.{:08x}.tmp", rand::random::<u32>()));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, self.dir.join(name)).await?;
        Ok(())
    }

    // Assembles the record without taking the lock; callers hold it.
    async fn read_record(&self) -> Result<TokenSet, StoreError> {
        let access_token = self.read_field(FILE_ACCESS_TOKEN).await?;
        let token_type = self.read_field(FILE_TOKEN_TYPE).await?;
        let refresh_token = self.read_field(FILE_REFRESH_TOKEN).await?;
        let expires_raw = self.read_field(FILE_EXPIRES_IN).await?;
        let scope = self.read_field(FILE_SCOPE).await?;

        let expires_at = DateTime::parse_from_rfc3339(expires_raw.trim())
            .map_err(|e| StoreError::Invalid(format!("expiry timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(TokenSet { access_token, token_type, refresh_token, scope, expires_at })
    }
}

#[async_trait]
impl TokenStore for FlatFileTokenStore {
    async fn has_token_set(&self) -> bool {
        let _guard = self.record_lock.read().await;
        for name in TOKEN_FILES {
            if !self.dir.join(name).exists() {
                return false;
            }
        }
        // Presence alone is not enough: the expiry must also decode, or the
        // record is treated as incomplete.
        self.read_record().await.is_ok()
    }

    async fn read_token_set(&self) -> Result<TokenSet, StoreError> {
        let _guard = self.record_lock.read().await;
        self.read_record().await
    }

    async fn write_token_set(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        let _guard = self.record_lock.write().await;

        // The access token lands last, so an interrupted write leaves the
        // record incomplete rather than pointing a stale expiry at a new
        // token (or vice versa).
        self.write_field(FILE_TOKEN_TYPE, &tokens.token_type).await?;
        self.write_field(FILE_REFRESH_TOKEN, &tokens.refresh_token).await?;
        self.write_field(FILE_EXPIRES_IN, &tokens.expires_at.to_rfc3339()).await?;
        self.write_field(FILE_SCOPE, &tokens.scope).await?;
        self.write_field(FILE_ACCESS_TOKEN, &tokens.access_token).await?;

        debug!(dir = %self.dir.display(), "token set stored");
        Ok(())
    }

    async fn read_csrf_state(&self) -> Result<String, StoreError> {
        self.read_field(FILE_STATE).await
    }

    async fn write_csrf_state(&self, state: &str) -> Result<(), StoreError> {
        self.write_field(FILE_STATE, state).await
    }

    async fn read_authorization_code(&self) -> Result<String, StoreError> {
        self.read_field(FILE_CODE).await
    }

    async fn write_authorization_code(&self, code: &str) -> Result<(), StoreError> {
        self.write_field(FILE_CODE, code).await
    }
}
