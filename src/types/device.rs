//! Device Authorization Types
//!
//! Types for OAuth2 Device Authorization Flow (RFC 8628).

use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::TokenResponse;
use crate::error::{OAuth2Error, OAuth2Result};

/// Polling interval used when the provider does not send one (RFC 8628 Section 3.2).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Device authorization response as it appears on the wire.
#[derive(Debug, Default, Deserialize)]
struct DeviceAuthorizationWire {
    #[serde(default)]
    device_code: String,
    #[serde(default)]
    user_code: String,
    #[serde(default)]
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    interval: Option<u64>,
}

/// Validated device authorization.
///
/// Consumed once by the polling engine and never persisted.
pub struct DeviceAuthorization {
    device_code: SecretString,
    /// User code to display.
    pub user_code: String,
    /// URI for user to visit.
    pub verification_uri: String,
    /// URI with code pre-filled (optional).
    pub verification_uri_complete: Option<String>,
    /// Lifetime of the device code in seconds.
    pub expires_in: u64,
    /// Minimum polling interval in seconds.
    pub interval: Option<u64>,
}

impl DeviceAuthorization {
    /// Create a device authorization directly.
    pub fn new(
        device_code: impl Into<String>,
        user_code: impl Into<String>,
        verification_uri: impl Into<String>,
        expires_in: u64,
        interval: Option<u64>,
    ) -> Self {
        Self {
            device_code: SecretString::new(device_code.into()),
            user_code: user_code.into(),
            verification_uri: verification_uri.into(),
            verification_uri_complete: None,
            expires_in,
            interval,
        }
    }

    /// Set the pre-filled verification URI.
    pub fn with_verification_uri_complete(mut self, uri: impl Into<String>) -> Self {
        self.verification_uri_complete = Some(uri.into());
        self
    }

    /// Decode and validate a device authorization response body.
    pub fn from_json(body: &str) -> OAuth2Result<Self> {
        let wire: DeviceAuthorizationWire =
            serde_json::from_str(body).map_err(|e| OAuth2Error::InvalidResponse {
                message: format!("failed to decode device authorization response: {}", e),
            })?;
        Self::from_wire(wire)
    }

    fn from_wire(wire: DeviceAuthorizationWire) -> OAuth2Result<Self> {
        if wire.device_code.is_empty() {
            return Err(OAuth2Error::MissingResponseData {
                field: "device_code",
            });
        }
        if wire.user_code.is_empty() {
            return Err(OAuth2Error::MissingResponseData { field: "user_code" });
        }
        if wire.verification_uri.is_empty() {
            return Err(OAuth2Error::MissingResponseData {
                field: "verification_uri",
            });
        }
        let expires_in = wire.expires_in.ok_or(OAuth2Error::MissingResponseData {
            field: "expires_in",
        })?;

        Ok(Self {
            device_code: SecretString::new(wire.device_code),
            user_code: wire.user_code,
            verification_uri: wire.verification_uri,
            verification_uri_complete: wire.verification_uri_complete,
            expires_in,
            interval: wire.interval,
        })
    }

    /// Opaque device code sent back while polling.
    pub fn device_code(&self) -> &SecretString {
        &self.device_code
    }

    /// Polling interval (default 5 seconds per RFC 8628).
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Lifetime of the device code.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }

    /// URI to show the user, preferring the pre-filled variant.
    pub fn prompt_uri(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .unwrap_or(&self.verification_uri)
    }
}

impl fmt::Debug for DeviceAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceAuthorization")
            .field("device_code", &"[REDACTED]")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Outcome of a single token poll that does not end in a hard error.
#[derive(Debug)]
pub enum PollOutcome {
    /// Token received successfully.
    Success(TokenResponse),
    /// Authorization still pending (user hasn't completed yet).
    Pending,
    /// Slow down - increase polling interval.
    SlowDown,
    /// Provider reports the device code as expired.
    Expired,
    /// Access denied by user.
    Denied { error_description: Option<String> },
}

#[cfg(test)]
pub(crate) fn device_code_matches(code: &SecretString, expected: &str) -> bool {
    use secrecy::ExposeSecret;
    code.expose_secret() == expected
}
