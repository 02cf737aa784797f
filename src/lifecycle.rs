//! Token lifecycle state machine
//!
//! Owns the sequence unauthenticated → pending-authorization → authorized →
//! stale → refreshed. Each invocation re-derives its state from a fresh
//! [`TokenStore`] read, so the machine survives across independent,
//! stateless request/response cycles:
//!
//! 1. A complete token set in the store means authorized (refreshing first
//!    when stale).
//! 2. Otherwise a callback whose `state` matches the persisted anti-CSRF
//!    value triggers a code exchange.
//! 3. Otherwise a fresh CSRF state is generated and persisted, and the
//!    authorization URL is handed back for the caller to render.
//!
//! "Not yet authorized" is a state, never an error; only configuration
//! problems are fatal, at construction.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::OAuthClient;
use crate::config::AuthConfig;
use crate::error::{AuthFailure, ConfigError, LifecycleError, StoreError};
use crate::store::TokenStore;
use crate::types::{CallbackContext, TokenSet};

/// Generate a random anti-CSRF state token.
///
/// 32 random bytes, base64url without padding (43 characters).
#[must_use]
pub fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Terminal authorization state of one invocation.
#[derive(Debug)]
pub enum Authorization {
    /// A usable token set is persisted; requests can be signed.
    Authorized {
        /// The current (possibly just-refreshed) token set
        tokens: TokenSet,
        /// Whether this invocation performed a refresh
        refreshed: bool,
    },

    /// No usable token set; the caller must render the authorization link.
    Unauthenticated {
        /// Browser-navigated URL carrying the freshly persisted CSRF state
        authorize_url: String,
        /// The exchange/refresh failure that degraded this invocation, if
        /// any
        failure: Option<AuthFailure>,
    },
}

impl Authorization {
    /// True for the authorized terminal state.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}

/// The token lifecycle for one caller identity.
///
/// Constructed with client credentials and a [`TokenStore`] handle; the
/// store is the only durable owner of tokens and CSRF state.
pub struct TokenLifecycle<S: TokenStore> {
    client: OAuthClient,
    store: Arc<S>,
    // Per-identity mutual exclusion around refresh-and-persist, so
    // concurrent invocations in the same process cannot race the token
    // write.
    refresh_lock: Mutex<()>,
}

impl<S: TokenStore> TokenLifecycle<S> {
    /// Create a lifecycle from validated credentials and a store handle.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the HTTP capability cannot be built.
    /// Missing credentials fail earlier, at [`AuthConfig`] construction.
    pub fn new(config: AuthConfig, store: Arc<S>) -> Result<Self, ConfigError> {
        Ok(Self { client: OAuthClient::new(config)?, store, refresh_lock: Mutex::new(()) })
    }

    /// Run one invocation of the state machine.
    ///
    /// At most two blocking network calls happen inside (token exchange or
    /// refresh); the staleness check, the refresh-and-persist, and the
    /// return are strictly sequential.
    ///
    /// # Errors
    /// Only store I/O failures propagate as errors. Endpoint failures
    /// degrade to [`Authorization::Unauthenticated`] with a typed
    /// [`AuthFailure`].
    pub async fn resolve(&self, ctx: &CallbackContext) -> Result<Authorization, LifecycleError> {
        if self.store.has_token_set().await {
            let tokens = self.store.read_token_set().await?;
            if tokens.is_stale() {
                return self.refresh_and_persist().await;
            }
            return Ok(Authorization::Authorized { tokens, refreshed: false });
        }

        if let (Some(state), Some(code)) = (&ctx.state, &ctx.code) {
            if !state.is_empty() && !code.is_empty() {
                match self.store.read_csrf_state().await {
                    Ok(stored) if stored == *state => {
                        return self.exchange_and_persist(code).await;
                    }
                    Ok(_) => {
                        // Lenient by design: a mismatch re-renders the link
                        debug!("callback state mismatch, reissuing authorization link");
                    }
                    Err(StoreError::NotFound) => {
                        debug!("callback without stored state, reissuing authorization link");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        self.issue_authorization_link(None).await
    }

    /// True iff the store holds a complete token set.
    pub async fn is_authorized(&self) -> bool {
        self.store.has_token_set().await
    }

    /// Current bearer credential (`<token_type> <access_token>`) for request
    /// signing.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when not authorized.
    pub async fn bearer(&self) -> Result<String, StoreError> {
        Ok(self.store.read_token_set().await?.authorization_header())
    }

    /// Force a refresh regardless of staleness.
    ///
    /// # Errors
    /// Store I/O failures propagate; an endpoint failure degrades to
    /// [`Authorization::Unauthenticated`] like in [`Self::resolve`].
    pub async fn refresh(&self) -> Result<Authorization, LifecycleError> {
        self.refresh_with(false).await
    }

    async fn refresh_and_persist(&self) -> Result<Authorization, LifecycleError> {
        self.refresh_with(true).await
    }

    async fn refresh_with(&self, only_if_stale: bool) -> Result<Authorization, LifecycleError> {
        let _guard = self.refresh_lock.lock().await;

        // Re-read under the lock: a concurrent invocation may have finished
        // the refresh while this one waited.
        let tokens = self.store.read_token_set().await?;
        if only_if_stale && !tokens.is_stale() {
            return Ok(Authorization::Authorized { tokens, refreshed: false });
        }

        let original_code = if self.client.config().resubmit_code_on_refresh {
            self.store.read_authorization_code().await.ok()
        } else {
            None
        };

        match self.client.refresh(&tokens.refresh_token, original_code.as_deref()).await {
            Ok(new_tokens) => {
                self.store.write_token_set(&new_tokens).await?;
                info!("access token refreshed");
                Ok(Authorization::Authorized { tokens: new_tokens, refreshed: true })
            }
            Err(e) => {
                // The prior record stays untouched; the invocation degrades
                // and the user must re-authorize.
                warn!(error = %e, "token refresh failed, forcing re-authorization");
                self.issue_authorization_link(Some(AuthFailure::Refresh(e))).await
            }
        }
    }

    async fn exchange_and_persist(&self, code: &str) -> Result<Authorization, LifecycleError> {
        match self.client.exchange_code(code).await {
            Ok(tokens) => {
                self.store.write_token_set(&tokens).await?;
                if self.client.config().resubmit_code_on_refresh {
                    self.store.write_authorization_code(code).await?;
                }
                info!("authorization code exchanged for tokens");
                Ok(Authorization::Authorized { tokens, refreshed: false })
            }
            Err(e) => {
                warn!(error = %e, "token exchange failed");
                self.issue_authorization_link(Some(AuthFailure::Exchange(e))).await
            }
        }
    }

    async fn issue_authorization_link(
        &self,
        failure: Option<AuthFailure>,
    ) -> Result<Authorization, LifecycleError> {
        // Single-use: each issuance overwrites and thereby invalidates the
        // prior state value.
        let state = generate_state();
        self.store.write_csrf_state(&state).await?;

        Ok(Authorization::Unauthenticated {
            authorize_url: self.client.authorize_url(&state),
            failure,
        })
    }
}
