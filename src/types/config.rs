//! Configuration Types
//!
//! Validated grant configuration. A `Config` only exists after
//! [`ConfigBuilder::build`](crate::builders::ConfigBuilder::build) succeeded.

use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::GrantType;
use crate::token::TokenStorage;

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &str = "openid profile email";

/// Timeout for the device authorization request.
pub const DEVICE_CODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for each token endpoint request.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for the discovery document request.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Grant configuration for a single command invocation.
pub struct Config {
    pub(crate) client_id: String,
    pub(crate) client_secret: Option<SecretString>,
    pub(crate) device_authorization_endpoint: Option<Url>,
    pub(crate) token_endpoint: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) audience: Option<String>,
    pub(crate) grant_type: GrantType,
    pub(crate) storage: Arc<dyn TokenStorage>,
}

impl Config {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret.as_ref()
    }

    pub fn device_authorization_endpoint(&self) -> Option<&Url> {
        self.device_authorization_endpoint.as_ref()
    }

    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub fn grant_type(&self) -> GrantType {
        self.grant_type
    }

    /// Storage capability the obtained token is handed to.
    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        &self.storage
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "device_authorization_endpoint",
                &self.device_authorization_endpoint.as_ref().map(Url::as_str),
            )
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("scopes", &self.scopes)
            .field("audience", &self.audience)
            .field("grant_type", &self.grant_type)
            .finish_non_exhaustive()
    }
}
