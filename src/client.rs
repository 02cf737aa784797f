//! OAuth 2.0 token-endpoint client
//!
//! Handles the confidential-client authorization-code flow:
//! - Authorization URL building
//! - Authorization code exchange
//! - Token refresh
//!
//! Both grants authenticate with HTTP Basic auth built from the client
//! id/secret. The endpoint's error signal is an `error` field in the decoded
//! JSON body; HTTP status is not inspected.

use chrono::Utc;
use reqwest::Client;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::{ConfigError, TokenEndpointError};
use crate::types::{OAuthErrorBody, TokenResponse, TokenSet};

/// Connect timeout for provider calls. A stalled call fails hard rather
/// than holding the invocation open.
const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Total request timeout for provider calls.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Build the HTTP client shared by the token-endpoint and resource clients.
pub(crate) fn build_http_client() -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// OAuth 2.0 client for the authorization-code and refresh-token grants.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: AuthConfig,
    http: Client,
}

impl OAuthClient {
    /// Create a new client from validated credentials.
    ///
    /// # Errors
    /// Returns [`ConfigError::HttpClient`] when no HTTP capability can be
    /// constructed. No network I/O happens here.
    pub fn new(config: AuthConfig) -> Result<Self, ConfigError> {
        let http = build_http_client()?;
        Ok(Self { config, http })
    }

    /// Build the browser-navigated authorization URL for a CSRF state.
    ///
    /// Query layout:
    /// `?scope=<scope>&state=<csrf>&redirect_uri=<url>&response_type=code&client_id=<id>`,
    /// every value percent-encoded.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("scope", self.config.scope.as_str()),
            ("state", state),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.endpoints.authorize_url, query)
    }

    /// Exchange a one-time authorization code for a full token set.
    ///
    /// # Errors
    /// Returns [`TokenEndpointError`] when the transport fails, the endpoint
    /// answers with an `error` field, or the body does not decode.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, TokenEndpointError> {
        debug!("exchanging authorization code");
        let form = [
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_url.clone()),
        ];
        self.post_token_request(&form).await
    }

    /// Obtain a fresh token set from a refresh token.
    ///
    /// `original_code` is resubmitted alongside the refresh token when the
    /// configured refresh policy requires it (endpoint-contract-dependent).
    ///
    /// # Errors
    /// Returns [`TokenEndpointError`] when the transport fails, the endpoint
    /// answers with an `error` field, or the body does not decode.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        original_code: Option<&str>,
    ) -> Result<TokenSet, TokenEndpointError> {
        debug!("refreshing access token");
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(code) = original_code {
            form.push(("code", code.to_string()));
        }
        self.post_token_request(&form).await
    }

    /// The configured redirect URL.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.config.redirect_url
    }

    /// A reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    async fn post_token_request(
        &self,
        form: &[(&str, String)],
    ) -> Result<TokenSet, TokenEndpointError> {
        let issued_at = Utc::now();

        let response = self
            .http
            .post(&self.config.endpoints.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .form(form)
            .send()
            .await?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TokenEndpointError::Decode(e.to_string()))?;

        if body.get("error").is_some() {
            let error: OAuthErrorBody = serde_json::from_value(body)
                .map_err(|e| TokenEndpointError::Decode(e.to_string()))?;
            return Err(TokenEndpointError::Endpoint(error));
        }

        let token_response: TokenResponse = serde_json::from_value(body)
            .map_err(|e| TokenEndpointError::Decode(e.to_string()))?;

        Ok(token_response.into_token_set(issued_at))
    }
}
