//! OAuth2 CLI Login
//!
//! Token acquisition for command-line tools.
//!
//! # Features
//!
//! - Device Authorization Flow (RFC 8628) with a bounded, cancellable polling loop
//! - Client Credentials Flow (RFC 6749 Section 4.4)
//! - Provider metadata discovery (RFC 8414)
//! - Pluggable token storage (in-memory, OS keychain)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oauth2_cli::{Config, DeviceAuthorization, InMemoryTokenStorage, OAuth2Client};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::builder()
//!         .client_id("my-cli")
//!         .device_authorization_endpoint("https://provider.com/oauth/device/code")
//!         .token_endpoint("https://provider.com/oauth/token")
//!         .storage(Arc::new(InMemoryTokenStorage::new()))
//!         .build()?;
//!
//!     let client = OAuth2Client::new(config)?;
//!     let show = |auth: &DeviceAuthorization| {
//!         println!("Visit {} and enter {}", auth.verification_uri, auth.user_code);
//!     };
//!     let token = client.login(&show, &CancellationToken::new()).await?;
//!     println!("Token type: {}", token.token_type);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: grant types, configuration, device authorization and token data
//! - `error`: error taxonomy shared by every exchange
//! - `core`: HTTP transport, discovery and form encoding
//! - `flows`: device authorization, polling and client credentials
//! - `token`: token storage backends
//! - `builders`: validated configuration builder
//! - `client`: high-level client running the configured grant

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{OAuth2Client, VerificationHandler};

// Re-export builders
pub use builders::ConfigBuilder;

// Re-export errors
pub use error::{
    get_user_message, parse_error_response, ConfigurationError, DiscoveryError, OAuth2Error,
    OAuth2ErrorResponse, OAuth2Result, StorageError,
};

// Re-export types
pub use types::{
    Config, DeviceAuthorization, GrantType, PollOutcome, ProviderMetadata, TokenResponse,
    DEFAULT_SCOPES,
};

// Re-export core components
pub use crate::core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // Discovery
    DefaultDiscoveryClient, DiscoveryClient, MockDiscoveryClient,
    // Forms
    join_scopes,
};

// Re-export flows
pub use flows::{
    ClientCredentialsFlow, ClientCredentialsFlowImpl, DeviceAuthorizationFlow,
    DeviceAuthorizationFlowImpl, DevicePoller,
};

// Re-export storage
#[cfg(feature = "keyring")]
pub use token::KeyringTokenStorage;
pub use token::{InMemoryTokenStorage, MockTokenStorage, TokenStorage};
