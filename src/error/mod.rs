//! OAuth2 Error Types
//!
//! Closed error taxonomy shared by discovery, configuration, every grant
//! exchange and the storage capability.

use std::time::Duration;
use thiserror::Error;

/// Boxed underlying cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Root error type for token acquisition.
#[derive(Error, Debug)]
pub enum OAuth2Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigurationError),

    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to reach OAuth2 provider: {message}")]
    HttpFailure {
        message: String,
        body: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Received invalid response from OAuth2 provider: {message}")]
    InvalidResponse { message: String },

    #[error("Missing required field in provider response: {field}")]
    MissingResponseData { field: &'static str },

    #[error("Authorization pending - user has not yet completed authorization")]
    AuthorizationPending,

    #[error("Polling too frequently - slow down")]
    SlowDown,

    #[error("Device code expired after {elapsed:?} - user did not authorize in time")]
    TokenExpired { elapsed: Duration },

    #[error("User denied authorization")]
    UserDenied { error_description: Option<String> },

    #[error("Token endpoint rejected the request: {body}")]
    InvalidTokenResponse { body: String },

    #[error("Invalid scope or client credentials: {body}")]
    InvalidScope { body: String },

    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal library error: {message}")]
    Internal { message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl OAuth2Error {
    /// Transport failure without a response body.
    pub fn http_failure(message: impl Into<String>) -> Self {
        Self::HttpFailure {
            message: message.into(),
            body: None,
            source: None,
        }
    }

    /// Internal plumbing failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "OAUTH2_CONFIG",
            Self::Discovery(_) => "OAUTH2_DISCOVERY",
            Self::HttpFailure { .. } => "OAUTH2_HTTP",
            Self::InvalidResponse { .. } => "OAUTH2_INVALID_RESPONSE",
            Self::MissingResponseData { .. } => "OAUTH2_MISSING_DATA",
            Self::AuthorizationPending => "OAUTH2_PENDING",
            Self::SlowDown => "OAUTH2_SLOW_DOWN",
            Self::TokenExpired { .. } => "OAUTH2_EXPIRED",
            Self::UserDenied { .. } => "OAUTH2_DENIED",
            Self::InvalidTokenResponse { .. } => "OAUTH2_TOKEN_RESPONSE",
            Self::InvalidScope { .. } => "OAUTH2_SCOPE",
            Self::UnexpectedStatus { .. } => "OAUTH2_STATUS",
            Self::Storage(_) => "OAUTH2_STORAGE",
            Self::Internal { .. } => "OAUTH2_INTERNAL",
            Self::Cancelled => "OAUTH2_CANCELLED",
        }
    }

    /// Loop-internal control signals of the device flow. These never reach
    /// callers of the polling engine.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AuthorizationPending | Self::SlowDown)
    }

    /// Check if error requires the user to log in again.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::TokenExpired { .. }
                | Self::UserDenied { .. }
                | Self::Storage(StorageError::TokenNotFound)
        )
    }
}

/// Configuration error. Raised before any network call is made.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("storage provider is required")]
    MissingStorage,

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid endpoint URL for {field}: {url}")]
    InvalidEndpoint { field: &'static str, url: String },

    #[error("scopes must be a non-empty list of non-empty strings")]
    InvalidScopes,

    #[error("unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    #[error("invalid client ID or secret: {body}")]
    ClientRejected { body: String },

    #[error("invalid value for {name}: {message}")]
    Environment { name: &'static str, message: String },
}

/// Provider metadata retrieval error.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("discovery document unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("invalid discovery response from {url}: {message}")]
    InvalidResponse {
        url: String,
        status: Option<u16>,
        message: String,
    },
}

/// Storage capability error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no valid token found, try logging in again")]
    TokenNotFound,

    #[error("failed to store token: {message}")]
    WriteFailed { message: String },

    #[error("failed to read token: {message}")]
    ReadFailed { message: String },

    #[error("failed to delete token: {message}")]
    DeleteFailed { message: String },
}

/// Result type for OAuth2 operations.
pub type OAuth2Result<T> = Result<T, OAuth2Error>;

/// OAuth2 error response body (RFC 6749 Section 5.2).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Get user-friendly error message.
pub fn get_user_message(error: &OAuth2Error) -> String {
    match error {
        OAuth2Error::InvalidConfig(e) => format!("The login is not configured correctly: {}.", e),
        OAuth2Error::Discovery(_) => {
            "Could not load the identity provider configuration. Please check the discovery URL."
                .to_string()
        }
        OAuth2Error::HttpFailure { .. } => {
            "Could not reach the identity provider. Please check your connection and try again."
                .to_string()
        }
        OAuth2Error::TokenExpired { .. } => {
            "The login code expired before it was confirmed. Please run login again.".to_string()
        }
        OAuth2Error::UserDenied { .. } => {
            "Access was denied. Please run login again and approve the request.".to_string()
        }
        OAuth2Error::InvalidScope { .. } => {
            "The identity provider rejected the requested scopes or client credentials."
                .to_string()
        }
        OAuth2Error::Storage(StorageError::TokenNotFound) => {
            "You are not logged in. Please run login first.".to_string()
        }
        OAuth2Error::Storage(_) => "Could not access the credential store.".to_string(),
        OAuth2Error::Cancelled => "Login cancelled.".to_string(),
        _ => "An authentication error occurred. Please try again.".to_string(),
    }
}
