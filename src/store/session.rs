//! Ephemeral per-session token storage
//!
//! In-process equivalent of a web session store: one [`SessionStore`]
//! registry shared by the front-end, with a [`SessionTokenStore`] handle
//! bound to a single session id. Entries live as long as the registry does.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::TokenStore;
use crate::error::StoreError;
use crate::types::TokenSet;

#[derive(Debug, Default, Clone)]
struct SessionEntry {
    tokens: Option<TokenSet>,
    csrf_state: Option<String>,
    code: Option<String>,
}

/// Registry of per-session token records.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionEntry>>,
}

impl SessionStore {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a store handle to one session id.
    #[must_use]
    pub fn for_session(&self, session_id: impl Into<String>) -> SessionTokenStore {
        SessionTokenStore { session_id: session_id.into(), sessions: Arc::clone(&self.sessions) }
    }

    /// Drop a session's entry entirely (session end / logout).
    pub fn remove_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

/// [`TokenStore`] backend scoped to one session id.
#[derive(Debug, Clone)]
pub struct SessionTokenStore {
    session_id: String,
    sessions: Arc<DashMap<String, SessionEntry>>,
}

impl SessionTokenStore {
    fn read<T>(&self, f: impl FnOnce(&SessionEntry) -> Option<T>) -> Result<T, StoreError> {
        self.sessions
            .get(&self.session_id)
            .and_then(|entry| f(&entry))
            .ok_or(StoreError::NotFound)
    }

    fn write(&self, f: impl FnOnce(&mut SessionEntry)) {
        let mut entry = self.sessions.entry(self.session_id.clone()).or_default();
        f(&mut entry);
    }
}

#[async_trait]
impl TokenStore for SessionTokenStore {
    async fn has_token_set(&self) -> bool {
        self.sessions.get(&self.session_id).is_some_and(|entry| entry.tokens.is_some())
    }

    async fn read_token_set(&self) -> Result<TokenSet, StoreError> {
        self.read(|entry| entry.tokens.clone())
    }

    async fn write_token_set(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        // Whole-record replace under the entry lock
        self.write(|entry| entry.tokens = Some(tokens.clone()));
        debug!(session = %self.session_id, "token set stored");
        Ok(())
    }

    async fn read_csrf_state(&self) -> Result<String, StoreError> {
        self.read(|entry| entry.csrf_state.clone())
    }

    async fn write_csrf_state(&self, state: &str) -> Result<(), StoreError> {
        self.write(|entry| entry.csrf_state = Some(state.to_string()));
        Ok(())
    }

    async fn read_authorization_code(&self) -> Result<String, StoreError> {
        self.read(|entry| entry.code.clone())
    }

    async fn write_authorization_code(&self, code: &str) -> Result<(), StoreError> {
        self.write(|entry| entry.code = Some(code.to_string()));
        Ok(())
    }
}
