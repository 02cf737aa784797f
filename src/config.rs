//! Client configuration
//!
//! Immutable per-process credentials and provider endpoints. All four
//! credential fields are required; absence is a fatal configuration error at
//! construction, before any network I/O.
//!
//! ## Environment Variables
//! - `LCTV_CLIENT_ID`: OAuth client identifier
//! - `LCTV_CLIENT_SECRET`: OAuth client secret
//! - `LCTV_REDIRECT_URL`: redirect URL registered with the provider
//! - `LCTV_SCOPE`: requested scope (optional, defaults to `read`)

use crate::error::ConfigError;

/// Default requested scope when none is configured.
pub const DEFAULT_SCOPE: &str = "read";

/// Provider endpoint set.
///
/// Defaults target the Livecoding.tv API; override for other providers with
/// the same authorization-code contract.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Browser-navigated authorization endpoint
    pub authorize_url: String,
    /// Token endpoint for the code and refresh grants
    pub token_url: String,
    /// Base URL for authenticated resource fetches
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: "https://www.livecoding.tv/o/authorize/".to_string(),
            token_url: "https://www.livecoding.tv/o/token/".to_string(),
            api_base: "https://www.livecoding.tv/api/".to_string(),
        }
    }
}

/// OAuth client credentials and flow policy
///
/// Invariant: `client_id`, `client_secret`, `redirect_url`, and `scope` are
/// non-empty once constructed.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client identifier
    pub client_id: String,

    /// OAuth client secret (authorization-code apps are confidential clients)
    pub client_secret: String,

    /// Redirect URL the provider sends the browser back to
    pub redirect_url: String,

    /// Requested scope (space-separated)
    pub scope: String,

    /// Provider endpoints
    pub endpoints: Endpoints,

    /// Whether the refresh grant resubmits the original authorization code.
    ///
    /// Token-endpoint-contract-dependent: some deployments require the
    /// original code alongside the refresh token. Off by default.
    pub resubmit_code_on_refresh: bool,
}

impl AuthConfig {
    /// Create a new configuration with the default endpoints and scope.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingField`] if any of the credentials is
    /// empty.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::with_scope(client_id, client_secret, redirect_url, DEFAULT_SCOPE)
    }

    /// Create a new configuration with an explicit scope.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingField`] if any of the four fields is
    /// empty.
    pub fn with_scope(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scope: scope.into(),
            endpoints: Endpoints::default(),
            resubmit_code_on_refresh: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load credentials from environment variables.
    ///
    /// `LCTV_SCOPE` is optional and defaults to [`DEFAULT_SCOPE`]; the other
    /// three variables are required.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingEnv`] for the first absent variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = env_var("LCTV_CLIENT_ID")?;
        let client_secret = env_var("LCTV_CLIENT_SECRET")?;
        let redirect_url = env_var("LCTV_REDIRECT_URL")?;
        let scope =
            std::env::var("LCTV_SCOPE").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
                DEFAULT_SCOPE.to_string()
            });

        Self::with_scope(client_id, client_secret, redirect_url, scope)
    }

    /// Override the provider endpoints.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Enable resubmitting the original authorization code on refresh.
    #[must_use]
    pub fn resubmit_code_on_refresh(mut self, enabled: bool) -> Self {
        self.resubmit_code_on_refresh = enabled;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::MissingField("client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::MissingField("client_secret"));
        }
        if self.redirect_url.is_empty() {
            return Err(ConfigError::MissingField("redirect_url"));
        }
        if self.scope.is_empty() {
            return Err(ConfigError::MissingField("scope"));
        }
        Ok(())
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).ok().filter(|v| !v.is_empty()).ok_or(ConfigError::MissingEnv(name))
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use super::*;

    /// Validates `AuthConfig::new` behavior for the valid credentials
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the defaults: scope `read`, livecoding.tv endpoints, code
    ///   resubmission disabled.
    #[test]
    fn test_config_defaults() {
        let config = AuthConfig::new("id", "secret", "https://app.example/cb").unwrap();

        assert_eq!(config.scope, "read");
        assert_eq!(config.endpoints.authorize_url, "https://www.livecoding.tv/o/authorize/");
        assert_eq!(config.endpoints.token_url, "https://www.livecoding.tv/o/token/");
        assert!(!config.resubmit_code_on_refresh);
    }

    /// Validates `AuthConfig` construction for every missing-credential
    /// combination.
    ///
    /// Assertions:
    /// - Ensures each empty field yields `ConfigError::MissingField` naming
    ///   that field.
    #[test]
    fn test_missing_credentials_are_fatal() {
        let cases: [(&str, &str, &str, &str, &str); 4] = [
            ("", "secret", "https://app.example/cb", "read", "client_id"),
            ("id", "", "https://app.example/cb", "read", "client_secret"),
            ("id", "secret", "", "read", "redirect_url"),
            ("id", "secret", "https://app.example/cb", "", "scope"),
        ];

        for (id, secret, redirect, scope, expected) in cases {
            let result = AuthConfig::with_scope(id, secret, redirect, scope);
            match result {
                Err(ConfigError::MissingField(field)) => assert_eq!(field, expected),
                other => panic!("expected MissingField({expected}), got {other:?}"),
            }
        }
    }

    /// Validates the builder-style overrides scenario.
    ///
    /// Assertions:
    /// - Confirms endpoint and policy overrides are applied.
    #[test]
    fn test_overrides() {
        let endpoints = Endpoints {
            authorize_url: "https://auth.example/authorize".to_string(),
            token_url: "https://auth.example/token".to_string(),
            api_base: "https://api.example/".to_string(),
        };

        let config = AuthConfig::new("id", "secret", "https://app.example/cb")
            .unwrap()
            .endpoints(endpoints)
            .resubmit_code_on_refresh(true);

        assert_eq!(config.endpoints.api_base, "https://api.example/");
        assert!(config.resubmit_code_on_refresh);
    }
}
