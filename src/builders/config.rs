//! Configuration Builder
//!
//! Fluent builder for grant configuration. Setters apply in call order and
//! the last write wins per field; nothing is checked until [`ConfigBuilder::build`].

use secrecy::SecretString;
use std::sync::Arc;
use url::Url;

use crate::core::discovery::DiscoveryClient;
use crate::error::{ConfigurationError, OAuth2Error, OAuth2Result};
use crate::token::TokenStorage;
use crate::types::{Config, GrantType, ProviderMetadata, DEFAULT_SCOPES};

pub const ENV_CLIENT_ID: &str = "OAUTH2_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "OAUTH2_CLIENT_SECRET";
pub const ENV_DEVICE_AUTHORIZATION_ENDPOINT: &str = "OAUTH2_DEVICE_AUTHORIZATION_ENDPOINT";
pub const ENV_TOKEN_ENDPOINT: &str = "OAUTH2_TOKEN_ENDPOINT";
pub const ENV_SCOPES: &str = "OAUTH2_SCOPES";
pub const ENV_AUDIENCE: &str = "OAUTH2_AUDIENCE";
pub const ENV_GRANT_TYPE: &str = "OAUTH2_GRANT_TYPE";

/// Grant configuration builder.
#[derive(Default)]
pub struct ConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    device_authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    scopes: Vec<String>,
    audience: Option<String>,
    grant_type: GrantType,
    storage: Option<Arc<dyn TokenStorage>>,
    discovery_error: Option<OAuth2Error>,
}

impl Config {
    /// Start a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

impl ConfigBuilder {
    /// Create a builder seeded with the default scopes and the device grant.
    pub fn new() -> Self {
        Self {
            scopes: DEFAULT_SCOPES.split_whitespace().map(String::from).collect(),
            grant_type: GrantType::DeviceCode,
            ..Default::default()
        }
    }

    /// Seed a builder from `OAUTH2_*` process environment variables.
    pub fn from_env() -> OAuth2Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Seed a builder from an arbitrary variable lookup. Unset and empty
    /// variables leave the seed untouched.
    pub fn from_env_with<F>(lookup: F) -> OAuth2Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut builder = Self::new();

        if let Some(value) = var(ENV_CLIENT_ID) {
            builder = builder.client_id(value);
        }
        if let Some(value) = var(ENV_CLIENT_SECRET) {
            builder = builder.client_secret(value);
        }
        if let Some(value) = var(ENV_DEVICE_AUTHORIZATION_ENDPOINT) {
            builder = builder.device_authorization_endpoint(value);
        }
        if let Some(value) = var(ENV_TOKEN_ENDPOINT) {
            builder = builder.token_endpoint(value);
        }
        if let Some(value) = var(ENV_SCOPES) {
            builder = builder.scopes(value.split_whitespace());
        }
        if let Some(value) = var(ENV_AUDIENCE) {
            builder = builder.audience(value);
        }
        if let Some(value) = var(ENV_GRANT_TYPE) {
            let grant_type = value.parse::<GrantType>().map_err(|e| {
                ConfigurationError::Environment {
                    name: ENV_GRANT_TYPE,
                    message: e.to_string(),
                }
            })?;
            builder = builder.grant_type(grant_type);
        }

        Ok(builder)
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set device authorization endpoint.
    pub fn device_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.device_authorization_endpoint = Some(endpoint.into());
        self
    }

    /// Set token endpoint.
    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    /// Replace the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Append a scope.
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Set the audience parameter.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set grant type.
    pub fn grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_type = grant_type;
        self
    }

    /// Set the storage capability the token is handed to.
    pub fn storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Apply endpoints from an already-fetched metadata document.
    pub fn provider_metadata(mut self, metadata: &ProviderMetadata) -> Self {
        if let Some(endpoint) = metadata.device_endpoint() {
            self.device_authorization_endpoint = Some(endpoint.to_string());
        }
        if let Some(endpoint) = metadata.token_endpoint() {
            self.token_endpoint = Some(endpoint.to_string());
        }
        self
    }

    /// Fetch provider metadata and apply its endpoints.
    ///
    /// A failed fetch does not abort assembly. The error is kept and returned
    /// by [`build`](Self::build) only if the endpoints it would have supplied
    /// are still missing at that point.
    pub async fn discover<D>(self, client: &D, url: &Url) -> Self
    where
        D: DiscoveryClient + ?Sized,
    {
        match client.fetch(url).await {
            Ok(metadata) => {
                let mut builder = self.provider_metadata(&metadata);
                builder.discovery_error = None;
                builder
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "discovery failed, deferring error");
                Self {
                    discovery_error: Some(e),
                    ..self
                }
            }
        }
    }

    /// Validate and build the configuration. The first failing rule is
    /// reported; no network call is made.
    pub fn build(self) -> OAuth2Result<Config> {
        let storage = self.storage.ok_or(ConfigurationError::MissingStorage)?;

        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or(ConfigurationError::MissingField { field: "client_id" })?;

        let needs_device_endpoint = self.grant_type == GrantType::DeviceCode;

        if let Some(error) = self.discovery_error {
            let endpoints_missing = self.token_endpoint.is_none()
                || (needs_device_endpoint && self.device_authorization_endpoint.is_none());
            if endpoints_missing {
                return Err(error);
            }
            tracing::warn!(error = %error, "discovery failed, using configured endpoints");
        }

        let device_authorization_endpoint = match self.device_authorization_endpoint {
            Some(endpoint) => Some(parse_endpoint("device_authorization_endpoint", &endpoint)?),
            None if needs_device_endpoint => {
                return Err(ConfigurationError::MissingField {
                    field: "device_authorization_endpoint",
                }
                .into())
            }
            None => None,
        };

        let token_endpoint = match self.token_endpoint {
            Some(endpoint) => parse_endpoint("token_endpoint", &endpoint)?,
            None => {
                return Err(ConfigurationError::MissingField {
                    field: "token_endpoint",
                }
                .into())
            }
        };

        if self.scopes.is_empty() || self.scopes.iter().any(|scope| scope.is_empty()) {
            return Err(ConfigurationError::InvalidScopes.into());
        }

        if self.grant_type == GrantType::ClientCredentials && self.client_secret.is_none() {
            return Err(ConfigurationError::MissingField {
                field: "client_secret",
            }
            .into());
        }

        if !self.grant_type.is_supported() {
            return Err(ConfigurationError::UnsupportedGrantType {
                grant_type: self.grant_type.to_string(),
            }
            .into());
        }

        Ok(Config {
            client_id,
            client_secret: self.client_secret,
            device_authorization_endpoint,
            token_endpoint,
            scopes: self.scopes,
            audience: self.audience.filter(|audience| !audience.is_empty()),
            grant_type: self.grant_type,
            storage,
        })
    }
}

/// Parse an absolute http(s) endpoint URL.
fn parse_endpoint(field: &'static str, value: &str) -> Result<Url, ConfigurationError> {
    let invalid = || ConfigurationError::InvalidEndpoint {
        field,
        url: value.to_string(),
    };

    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::discovery::MockDiscoveryClient;
    use crate::error::DiscoveryError;
    use crate::token::InMemoryTokenStorage;
    use std::collections::HashMap;

    const DISCOVERY_URL: &str = "https://ex/.well-known/openid-configuration";

    fn storage() -> Arc<dyn TokenStorage> {
        Arc::new(InMemoryTokenStorage::new())
    }

    fn valid_builder() -> ConfigBuilder {
        Config::builder()
            .client_id("cli")
            .device_authorization_endpoint("https://ex/device")
            .token_endpoint("https://ex/token")
            .storage(storage())
    }

    fn config_error(result: OAuth2Result<Config>) -> ConfigurationError {
        match result {
            Err(OAuth2Error::InvalidConfig(e)) => e,
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_valid_config() {
        let config = valid_builder().audience("api").build().unwrap();

        assert_eq!(config.client_id(), "cli");
        assert_eq!(config.token_endpoint().as_str(), "https://ex/token");
        assert_eq!(
            config.device_authorization_endpoint().map(Url::as_str),
            Some("https://ex/device")
        );
        assert_eq!(config.scopes(), &["openid", "profile", "email"]);
        assert_eq!(config.audience(), Some("api"));
        assert_eq!(config.grant_type(), GrantType::DeviceCode);
    }

    #[test]
    fn test_storage_checked_first() {
        let err = config_error(Config::builder().build());
        assert!(matches!(err, ConfigurationError::MissingStorage));
    }

    #[test]
    fn test_missing_client_id() {
        let err = config_error(valid_builder().client_id("").build());
        assert!(matches!(
            err,
            ConfigurationError::MissingField { field: "client_id" }
        ));
    }

    #[test]
    fn test_missing_device_endpoint() {
        let err = config_error(
            Config::builder()
                .client_id("cli")
                .token_endpoint("https://ex/token")
                .storage(storage())
                .build(),
        );
        assert!(matches!(
            err,
            ConfigurationError::MissingField {
                field: "device_authorization_endpoint"
            }
        ));
    }

    #[test]
    fn test_malformed_endpoints() {
        let err = config_error(valid_builder().device_authorization_endpoint("not a url").build());
        assert!(matches!(
            err,
            ConfigurationError::InvalidEndpoint {
                field: "device_authorization_endpoint",
                ..
            }
        ));

        let err = config_error(valid_builder().token_endpoint("/token").build());
        assert!(matches!(
            err,
            ConfigurationError::InvalidEndpoint {
                field: "token_endpoint",
                ..
            }
        ));

        let err = config_error(valid_builder().token_endpoint("ftp://ex/token").build());
        assert!(matches!(err, ConfigurationError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_invalid_scopes() {
        let err = config_error(valid_builder().scopes(Vec::<String>::new()).build());
        assert!(matches!(err, ConfigurationError::InvalidScopes));

        let err = config_error(valid_builder().scopes(["read", ""]).build());
        assert!(matches!(err, ConfigurationError::InvalidScopes));
    }

    #[test]
    fn test_first_failure_wins() {
        // Both the client id and the scopes are invalid; client id comes first.
        let err = config_error(
            valid_builder()
                .client_id("")
                .scopes(Vec::<String>::new())
                .build(),
        );
        assert!(matches!(
            err,
            ConfigurationError::MissingField { field: "client_id" }
        ));
    }

    #[test]
    fn test_client_credentials_rules() {
        let builder = || {
            Config::builder()
                .client_id("svc")
                .token_endpoint("https://ex/token")
                .grant_type(GrantType::ClientCredentials)
                .storage(storage())
        };

        let err = config_error(builder().build());
        assert!(matches!(
            err,
            ConfigurationError::MissingField {
                field: "client_secret"
            }
        ));

        let config = builder().client_secret("s3cret").build().unwrap();
        assert!(config.device_authorization_endpoint().is_none());
        assert!(!format!("{:?}", config).contains("s3cret"));

        // A supplied device endpoint must still be well-formed.
        let err = config_error(
            builder()
                .client_secret("s3cret")
                .device_authorization_endpoint("::")
                .build(),
        );
        assert!(matches!(err, ConfigurationError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_unsupported_grant_type() {
        let err = config_error(valid_builder().grant_type(GrantType::Password).build());
        assert!(matches!(
            err,
            ConfigurationError::UnsupportedGrantType { .. }
        ));
    }

    #[test]
    fn test_last_write_wins() {
        let config = valid_builder()
            .token_endpoint("https://first/token")
            .token_endpoint("https://second/token")
            .add_scope("offline_access")
            .build()
            .unwrap();

        assert_eq!(config.token_endpoint().as_str(), "https://second/token");
        assert_eq!(config.scopes().last().map(String::as_str), Some("offline_access"));
    }

    #[tokio::test]
    async fn test_discover_populates_endpoints() {
        let discovery = MockDiscoveryClient::new();
        discovery.set_document(
            DISCOVERY_URL,
            ProviderMetadata {
                issuer: "https://ex".to_string(),
                authorization_endpoint: "https://ex/authorize".to_string(),
                token_endpoint: "https://ex/token".to_string(),
                device_authorization_endpoint: Some("https://ex/device".to_string()),
                jwks_uri: Some("https://ex/jwks".to_string()),
                ..Default::default()
            },
        );

        let config = Config::builder()
            .discover(&discovery, &Url::parse(DISCOVERY_URL).unwrap())
            .await
            .client_id("cli")
            .storage(storage())
            .build()
            .unwrap();

        assert_eq!(config.token_endpoint().as_str(), "https://ex/token");
        assert_eq!(
            config.device_authorization_endpoint().map(Url::as_str),
            Some("https://ex/device")
        );
    }

    #[tokio::test]
    async fn test_discovery_failure_is_deferred() {
        let discovery = MockDiscoveryClient::new();
        let url = Url::parse(DISCOVERY_URL).unwrap();

        let result = Config::builder()
            .discover(&discovery, &url)
            .await
            .client_id("cli")
            .storage(storage())
            .build();
        assert!(matches!(
            result,
            Err(OAuth2Error::Discovery(DiscoveryError::Unreachable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_discovery_failure_with_manual_fallback() {
        let discovery = MockDiscoveryClient::new();
        let url = Url::parse(DISCOVERY_URL).unwrap();

        let config = Config::builder()
            .discover(&discovery, &url)
            .await
            .client_id("cli")
            .device_authorization_endpoint("https://manual/device")
            .token_endpoint("https://manual/token")
            .storage(storage())
            .build()
            .unwrap();

        assert_eq!(config.token_endpoint().as_str(), "https://manual/token");
    }

    #[test]
    fn test_from_env() {
        let vars: HashMap<&str, &str> = [
            (ENV_CLIENT_ID, "svc"),
            (ENV_CLIENT_SECRET, "s3cret"),
            (ENV_TOKEN_ENDPOINT, "https://ex/token"),
            (ENV_SCOPES, "read  write"),
            (ENV_AUDIENCE, ""),
            (ENV_GRANT_TYPE, "client_credentials"),
        ]
        .into_iter()
        .collect();

        let config = ConfigBuilder::from_env_with(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap()
            .storage(storage())
            .build()
            .unwrap();

        assert_eq!(config.client_id(), "svc");
        assert_eq!(config.scopes(), &["read", "write"]);
        assert_eq!(config.audience(), None);
        assert_eq!(config.grant_type(), GrantType::ClientCredentials);
    }

    #[test]
    fn test_from_env_bad_grant_type() {
        let result = ConfigBuilder::from_env_with(|name| {
            (name == ENV_GRANT_TYPE).then(|| "implicit".to_string())
        });
        assert!(matches!(
            result,
            Err(OAuth2Error::InvalidConfig(ConfigurationError::Environment {
                name: ENV_GRANT_TYPE,
                ..
            }))
        ));
    }
}
