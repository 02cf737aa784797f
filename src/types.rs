//! OAuth 2.0 types and structures
//!
//! Defines the data shapes shared across the token lifecycle: the stored
//! token record, the token-endpoint wire response, the endpoint error body,
//! and the redirect callback parameters.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin before actual expiry at which a token counts as stale.
///
/// Fixed by design, not configurable: tokens are refreshed well before they
/// expire so an in-flight API request never rides on a token that lapses
/// mid-call.
pub const STALENESS_MARGIN_SECS: i64 = 7200;

/// OAuth 2.0 access and refresh tokens with metadata
///
/// The authorization state as persisted in a [`TokenStore`]. A `TokenSet` is
/// complete-or-nothing: all five fields are present and consistent, or the
/// caller is unauthenticated. It is created by a code exchange, overwritten
/// wholesale by a refresh, and never mutated field-by-field.
///
/// [`TokenStore`]: crate::store::TokenStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer" in practice)
    pub token_type: String,

    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Granted scopes (space-separated)
    pub scope: String,

    /// Absolute expiration timestamp (UTC), derived at issuance as
    /// now + server-reported `expires_in` seconds
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Check whether the token should be refreshed before use.
    ///
    /// A token is stale when less than [`STALENESS_MARGIN_SECS`] of lifetime
    /// remains. Exactly the margin remaining is not stale.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    /// Staleness check against an explicit clock, for deterministic tests.
    #[must_use]
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        (self.expires_at - now).num_seconds() < STALENESS_MARGIN_SECS
    }

    /// Get seconds until token expiration (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }

    /// Value for the `Authorization` header, `<token_type> <access_token>`.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// OAuth token response from the authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749). Deserialized from
/// the token endpoint on both the code and refresh grants.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub scope: String,
}

impl TokenResponse {
    /// Convert into a [`TokenSet`], fixing the absolute expiry at `issued_at +
    /// expires_in`.
    #[must_use]
    pub fn into_token_set(self, issued_at: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            scope: self.scope,
            expires_at: issued_at + Duration::seconds(self.expires_in),
        }
    }
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        response.into_token_set(Utc::now())
    }
}

/// OAuth error response from the authorization or resource server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2). Presence of the
/// `error` field in a decoded body is the single error signal the API gives;
/// HTTP status is not inspected.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthErrorBody {}

/// Redirect callback parameters for one invocation
///
/// Carries the `state` and `code` query parameters from the authorization
/// redirect. Passed explicitly into the lifecycle rather than read from
/// ambient request globals; an invocation without a callback uses
/// [`CallbackContext::empty`].
#[derive(Debug, Clone, Default)]
pub struct CallbackContext {
    /// Anti-CSRF `state` parameter from the redirect, if any
    pub state: Option<String>,
    /// One-time authorization code from the redirect, if any
    pub code: Option<String>,
}

impl CallbackContext {
    /// Context for an invocation that is not returning from a redirect.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Context for an invocation carrying redirect parameters.
    #[must_use]
    pub fn from_callback(state: impl Into<String>, code: impl Into<String>) -> Self {
        Self { state: Some(state.into()), code: Some(code.into()) }
    }

    /// True when both redirect parameters are present and non-empty.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        matches!((&self.state, &self.code), (Some(s), Some(c)) if !s.is_empty() && !c.is_empty())
    }
}
