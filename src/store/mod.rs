//! Token storage capability
//!
//! Durable key/value persistence for the token record and the anti-CSRF
//! `state` value, behind a uniform trait so the lifecycle survives across
//! independent, stateless request/response cycles.
//!
//! Two interchangeable backends:
//! - [`SessionStore`] / [`SessionTokenStore`]: ephemeral per-session storage
//!   for multi-user web front-ends
//! - [`FlatFileTokenStore`]: flat persisted storage for single-tenant or
//!   server-to-server use
//!
//! Each store handle is bound to one caller identity (a session id or a
//! fixed working directory). Writes replace whole records; readers never
//! observe a mix of old and new fields.

mod flat_file;
mod session;

use async_trait::async_trait;

pub use flat_file::FlatFileTokenStore;
pub use session::{SessionStore, SessionTokenStore};

use crate::error::StoreError;
use crate::types::TokenSet;

/// Durable owner of the token record and per-authorization-attempt values.
///
/// The lifecycle holds only transient in-memory copies during one
/// invocation; this trait is the exclusive persistence seam.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// True iff a complete [`TokenSet`] is present.
    ///
    /// The sole authorization predicate. Must never report true for a
    /// partially written record.
    async fn has_token_set(&self) -> bool;

    /// Read the stored token record.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no complete record exists.
    async fn read_token_set(&self) -> Result<TokenSet, StoreError>;

    /// Replace the stored token record as one logical unit.
    ///
    /// # Errors
    /// Returns the underlying I/O failure; a failed write must not leave
    /// [`Self::has_token_set`] reporting true.
    async fn write_token_set(&self, tokens: &TokenSet) -> Result<(), StoreError>;

    /// Read the persisted anti-CSRF state.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no authorization link was issued yet.
    async fn read_csrf_state(&self) -> Result<String, StoreError>;

    /// Persist a fresh anti-CSRF state, invalidating any prior value.
    ///
    /// # Errors
    /// Returns the underlying I/O failure.
    async fn write_csrf_state(&self, state: &str) -> Result<(), StoreError>;

    /// Read the retained authorization code.
    ///
    /// Only populated when the refresh policy resubmits the original code.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no code was retained.
    async fn read_authorization_code(&self) -> Result<String, StoreError>;

    /// Retain the authorization code for refresh-time resubmission.
    ///
    /// # Errors
    /// Returns the underlying I/O failure.
    async fn write_authorization_code(&self, code: &str) -> Result<(), StoreError>;
}
