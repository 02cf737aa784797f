//! Error types for the token lifecycle
//!
//! Follows a split error design: fatal configuration problems surface at
//! construction time, expected "not yet authorized" situations are states
//! rather than errors, and endpoint failures during exchange/refresh are
//! typed non-fatal outcomes the caller can react to.

use thiserror::Error;

use crate::types::OAuthErrorBody;

/// Fatal configuration error, raised at construction and never recovered.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential field is empty or missing
    #[error("missing required configuration: {0}")]
    MissingField(&'static str),

    /// A required environment variable is absent
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    /// The HTTP client could not be constructed
    #[error("http client setup failed: {0}")]
    HttpClient(String),
}

/// Token store I/O error.
///
/// Each backend performs real I/O (session map or filesystem); failures are
/// reported, not swallowed. `NotFound` is the expected signal for an absent
/// or incomplete record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No complete record stored under the requested key
    #[error("not found")]
    NotFound,

    /// Filesystem operation failed
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be decoded
    #[error("stored value invalid: {0}")]
    Invalid(String),
}

/// Failure talking to the token endpoint during exchange or refresh.
#[derive(Debug, Error)]
pub enum TokenEndpointError {
    /// The endpoint answered with an `error` field in the JSON body
    #[error("endpoint rejected the grant: {0}")]
    Endpoint(OAuthErrorBody),

    /// The HTTP request itself failed (connect timeout, DNS, TLS, ...)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape
    #[error("response decode error: {0}")]
    Decode(String),
}

/// Typed non-fatal authorization failure surfaced by the lifecycle.
///
/// Distinguishable from a functioning token set; the caller re-renders the
/// authorization link and may inspect the cause.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// Authorization-code exchange failed
    #[error("token exchange failed: {0}")]
    Exchange(#[source] TokenEndpointError),

    /// Refresh-token grant failed; the caller must re-authorize
    #[error("token refresh failed: {0}")]
    Refresh(#[source] TokenEndpointError),
}

/// Lifecycle error for conditions that are neither "not yet authorized"
/// states nor endpoint failures — chiefly store I/O.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Token store I/O failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resource fetch failure surfaced by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No complete token set is available for request signing
    #[error("not authorized")]
    NotAuthorized,

    /// Token store I/O failed while loading the bearer credential
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The HTTP request failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The resource endpoint answered with an `error` field
    #[error("api request failed: {0}")]
    Endpoint(OAuthErrorBody),

    /// The response body was not valid JSON
    #[error("response decode error: {0}")]
    Decode(String),
}
