//! Discovery Types
//!
//! Authorization server metadata (RFC 8414 / OpenID Connect Discovery).

use serde::{Deserialize, Serialize};

/// Provider metadata document.
///
/// Every field is optional on the wire; providers publish very different
/// subsets of the standard keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer identifier.
    #[serde(default)]
    pub issuer: String,
    /// Authorization endpoint URL.
    #[serde(default)]
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    #[serde(default)]
    pub token_endpoint: String,
    /// Device authorization endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_authorization_endpoint: Option<String>,
    /// Userinfo endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    /// JWKS URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    /// Dynamic client registration endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,
    /// Supported scopes.
    #[serde(default)]
    pub scopes_supported: Vec<String>,
    /// Supported response types.
    #[serde(default)]
    pub response_types_supported: Vec<String>,
    /// Supported grant types.
    #[serde(default)]
    pub grant_types_supported: Vec<String>,
    /// Token endpoint auth methods.
    #[serde(default)]
    pub token_endpoint_auth_methods_supported: Vec<String>,
    /// Token endpoint signing algorithms.
    #[serde(default)]
    pub token_endpoint_auth_signing_alg_values_supported: Vec<String>,
    /// Supported UI locales.
    #[serde(default)]
    pub ui_locales_supported: Vec<String>,
    /// Human-readable documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_documentation: Option<String>,
}

impl ProviderMetadata {
    /// Endpoint to request device codes from.
    ///
    /// Falls back to the authorization endpoint when the provider does not
    /// advertise a dedicated device authorization endpoint.
    pub fn device_endpoint(&self) -> Option<&str> {
        self.device_authorization_endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| non_empty(&self.authorization_endpoint))
    }

    /// Token endpoint, if present.
    pub fn token_endpoint(&self) -> Option<&str> {
        non_empty(&self.token_endpoint)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
