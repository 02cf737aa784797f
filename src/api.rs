//! Authenticated resource client
//!
//! Thin layer over the HTTP transport: signs a GET with the current bearer
//! credential, decodes the JSON envelope, and surfaces either the payload or
//! a typed failure. An `error` field in the decoded body is the single error
//! signal; HTTP status is not inspected. The caller re-checks staleness via
//! the lifecycle and may retry once after an out-of-band refresh.

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::{ApiError, ConfigError, StoreError};
use crate::store::TokenStore;

/// Client for signed resource fetches against the provider API.
pub struct ApiClient<S: TokenStore> {
    store: Arc<S>,
    http: Client,
    api_base: String,
}

impl<S: TokenStore> ApiClient<S> {
    /// Create a resource client sharing the lifecycle's token store.
    ///
    /// # Errors
    /// Returns [`ConfigError::HttpClient`] when no HTTP capability can be
    /// constructed.
    pub fn new(config: &AuthConfig, store: Arc<S>) -> Result<Self, ConfigError> {
        let http = crate::client::build_http_client()?;
        Ok(Self { store, http, api_base: config.endpoints.api_base.clone() })
    }

    /// Fetch a JSON resource by path, signed with the stored bearer token.
    ///
    /// # Errors
    /// - [`ApiError::NotAuthorized`] when no complete token set is stored
    /// - [`ApiError::Endpoint`] when the decoded body carries an `error`
    ///   field
    /// - [`ApiError::Transport`] / [`ApiError::Decode`] for transport and
    ///   body-shape failures
    pub async fn fetch(&self, resource: &str) -> Result<Value, ApiError> {
        let tokens = match self.store.read_token_set().await {
            Ok(tokens) => tokens,
            Err(StoreError::NotFound) => return Err(ApiError::NotAuthorized),
            Err(e) => return Err(ApiError::Store(e)),
        };

        let url =
            format!("{}/{}", self.api_base.trim_end_matches('/'), resource.trim_start_matches('/'));
        debug!(%url, "fetching api resource");

        let response = self
            .http
            .get(&url)
            .header("Authorization", tokens.authorization_header())
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()
            .await?;

        let body: Value = response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;

        if let Some(error) = body.get("error") {
            // The error value is not always a string on this API; normalize
            // either shape into the typed failure.
            let code = error.as_str().map_or_else(|| error.to_string(), str::to_string);
            let description =
                body.get("error_description").and_then(Value::as_str).map(str::to_string);
            return Err(ApiError::Endpoint(crate::types::OAuthErrorBody {
                error: code,
                error_description: description,
            }));
        }

        Ok(body)
    }

    /// Report whether a channel is currently live.
    ///
    /// Convenience over `v1/livestreams/<channel>/`, reading the `is_live`
    /// flag from the payload.
    ///
    /// # Errors
    /// Propagates [`Self::fetch`] failures; [`ApiError::Decode`] when the
    /// payload lacks a boolean `is_live`.
    pub async fn channel_is_live(&self, channel: &str) -> Result<bool, ApiError> {
        let data = self.fetch(&format!("v1/livestreams/{channel}/")).await?;
        data.get("is_live")
            .and_then(Value::as_bool)
            .ok_or_else(|| ApiError::Decode("payload missing boolean is_live".to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for api. Signed requests are covered by the wiremock
    //! integration tests.
    use super::*;
    use crate::store::SessionStore;

    /// Validates `ApiClient::fetch` behavior for the unauthorized scenario.
    ///
    /// Assertions:
    /// - Ensures an empty store yields `ApiError::NotAuthorized` without any
    ///   network I/O.
    #[tokio::test]
    async fn test_fetch_requires_authorization() {
        let config = AuthConfig::new("id", "secret", "https://app.example/cb").unwrap();
        let store = Arc::new(SessionStore::new().for_session("sess-1"));
        let api = ApiClient::new(&config, store).unwrap();

        let result = api.fetch("v1/livestreams/somebody/").await;
        assert!(matches!(result, Err(ApiError::NotAuthorized)));
    }
}
