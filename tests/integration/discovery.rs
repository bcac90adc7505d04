//! Integration tests for provider discovery

use super::*;
use oauth2_cli::{Config, DefaultDiscoveryClient, DiscoveryClient, DiscoveryError, OAuth2Error};
use url::Url;

#[tokio::test]
async fn test_discovery_success() {
    let server = setup_mock_server().await;
    let expected = mount_discovery(&server).await;

    let client = DefaultDiscoveryClient::new(transport());
    let metadata = client.fetch(&discovery_url(&server)).await.unwrap();

    assert_eq!(metadata, expected);
    assert_eq!(
        metadata.device_endpoint(),
        Some(format!("{}/device", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_discovery_error_status() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = DefaultDiscoveryClient::new(transport());
    let err = client.fetch(&discovery_url(&server)).await.unwrap_err();

    assert!(matches!(
        err,
        OAuth2Error::Discovery(DiscoveryError::InvalidResponse {
            status: Some(500),
            ..
        })
    ));
}

#[tokio::test]
async fn test_discovery_undecodable() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
        .mount(&server)
        .await;

    let client = DefaultDiscoveryClient::new(transport());
    let err = client.fetch(&discovery_url(&server)).await.unwrap_err();

    assert!(matches!(
        err,
        OAuth2Error::Discovery(DiscoveryError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_discovery_unreachable() {
    let client = DefaultDiscoveryClient::new(transport());
    let url = Url::parse("http://127.0.0.1:1/.well-known/openid-configuration").unwrap();

    let err = client.fetch(&url).await.unwrap_err();
    assert!(matches!(
        err,
        OAuth2Error::Discovery(DiscoveryError::Unreachable { .. })
    ));
}

#[tokio::test]
async fn test_discovery_populates_config() {
    let server = setup_mock_server().await;
    mount_discovery(&server).await;

    let discovery = DefaultDiscoveryClient::new(transport());
    let config = Config::builder()
        .discover(&discovery, &discovery_url(&server))
        .await
        .client_id("cli")
        .storage(Arc::new(oauth2_cli::InMemoryTokenStorage::new()))
        .build()
        .unwrap();

    assert_eq!(
        config.token_endpoint().as_str(),
        format!("{}/token", server.uri())
    );
    assert_eq!(
        config.device_authorization_endpoint().map(|u| u.to_string()),
        Some(format!("{}/device", server.uri()))
    );
}
