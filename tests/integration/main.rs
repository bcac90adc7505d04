//! Integration tests using WireMock
//!
//! These tests run the grants end to end over real HTTP against a mock
//! provider: discovery, device code, polling, client credentials and storage.

mod client_credentials;
mod device_flow;
mod discovery;

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth2_cli::{ProviderMetadata, ReqwestHttpTransport};

/// Helper to create a mock provider.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Default reqwest transport.
pub fn transport() -> Arc<ReqwestHttpTransport> {
    Arc::new(ReqwestHttpTransport::new().expect("Failed to build transport"))
}

/// Discovery URL on the mock provider.
pub fn discovery_url(server: &MockServer) -> url::Url {
    url::Url::parse(&format!(
        "{}/.well-known/openid-configuration",
        server.uri()
    ))
    .expect("valid discovery URL")
}

/// Metadata document advertising the mock provider's endpoints.
pub fn provider_document(server: &MockServer) -> serde_json::Value {
    let base = server.uri();
    json!({
        "issuer": base,
        "authorization_endpoint": format!("{}/authorize", base),
        "token_endpoint": format!("{}/token", base),
        "device_authorization_endpoint": format!("{}/device", base),
        "jwks_uri": format!("{}/jwks", base)
    })
}

/// Serve the metadata document.
pub async fn mount_discovery(server: &MockServer) -> ProviderMetadata {
    let document = provider_document(server);
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document.clone()))
        .mount(server)
        .await;
    serde_json::from_value(document).expect("valid metadata")
}
