//! OAuth 2.0 authorization-code client helper for the Livecoding.tv-style
//! streaming API.
//!
//! Negotiates, stores, refreshes, and applies bearer tokens across
//! independent, stateless request/response cycles, then signs resource
//! fetches with the current credential. The core is the token lifecycle
//! state machine and the storage seam that lets it survive process
//! boundaries.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  TokenLifecycle  │  state machine (unauthenticated → authorized → stale → refreshed)
//! └────────┬─────────┘
//!          │
//!          ├──► OAuthClient   (authorization URL, code exchange, refresh)
//!          ├──► TokenStore    (SessionTokenStore | FlatFileTokenStore)
//!          │
//! ┌────────┴─────────┐
//! │    ApiClient     │  signed GET + JSON envelope decoding
//! └──────────────────┘
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lctv_auth::{ApiClient, AuthConfig, Authorization, CallbackContext, TokenLifecycle};
//! use lctv_auth::store::FlatFileTokenStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from LCTV_CLIENT_ID / LCTV_CLIENT_SECRET / LCTV_REDIRECT_URL
//!     let config = AuthConfig::from_env()?;
//!
//!     let store = Arc::new(FlatFileTokenStore::new(".lctv-tokens")?);
//!     let lifecycle = TokenLifecycle::new(config.clone(), Arc::clone(&store))?;
//!
//!     // A front-end passes the redirect's `state`/`code` here; first visits
//!     // use an empty context.
//!     match lifecycle.resolve(&CallbackContext::empty()).await? {
//!         Authorization::Unauthenticated { authorize_url, .. } => {
//!             println!("This app is not yet authorized. Open: {authorize_url}");
//!         }
//!         Authorization::Authorized { .. } => {
//!             let api = ApiClient::new(&config, store)?;
//!             let live = api.channel_is_live("my-channel").await?;
//!             println!("my-channel is {}", if live { "online" } else { "offline" });
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`config`]: client credentials, provider endpoints, refresh policy
//! - [`types`]: token record, wire types, callback context, staleness rule
//! - [`store`]: storage capability trait and the two backends
//! - [`client`]: token-endpoint HTTP client
//! - [`lifecycle`]: the state machine
//! - [`api`]: signed resource fetches
//! - [`error`]: fatal/expected error split

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod types;

pub use api::ApiClient;
pub use client::OAuthClient;
pub use config::{AuthConfig, Endpoints};
pub use error::{ApiError, AuthFailure, ConfigError, LifecycleError, StoreError, TokenEndpointError};
pub use lifecycle::{generate_state, Authorization, TokenLifecycle};
pub use store::{FlatFileTokenStore, SessionStore, SessionTokenStore, TokenStore};
pub use types::{CallbackContext, OAuthErrorBody, TokenResponse, TokenSet, STALENESS_MARGIN_SECS};
