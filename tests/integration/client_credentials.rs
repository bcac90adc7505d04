//! Integration tests for the client credentials flow

use super::*;
use oauth2_cli::{
    Config, DeviceAuthorization, GrantType, InMemoryTokenStorage, OAuth2Client, OAuth2Error,
    TokenStorage,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::body_string_contains;

fn client_credentials_config(server: &MockServer, storage: Arc<InMemoryTokenStorage>) -> Config {
    Config::builder()
        .client_id("svc")
        .client_secret("s3cret")
        .token_endpoint(format!("{}/token", server.uri()))
        .scopes(["read", "write"])
        .audience("https://api.example.com")
        .grant_type(GrantType::ClientCredentials)
        .storage(storage)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_client_credentials_success() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=svc"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains("scope=read+write"))
        .and(body_string_contains("audience=https%3A%2F%2Fapi.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "svc-tok",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryTokenStorage::new());
    let client = OAuth2Client::with_transport(
        client_credentials_config(&server, storage.clone()),
        transport(),
    );

    let token = client
        .login(&|_: &DeviceAuthorization| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(token.access_token, "svc-tok");
    assert_eq!(storage.get().await.unwrap(), "svc-tok");
}

#[tokio::test]
async fn test_client_credentials_rejected() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryTokenStorage::new());
    let client = OAuth2Client::with_transport(
        client_credentials_config(&server, storage.clone()),
        transport(),
    );

    let err = client.client_credentials_token().await.unwrap_err();
    match err {
        OAuth2Error::HttpFailure { message, body, .. } => {
            assert!(message.contains("401"));
            assert!(body.unwrap_or_default().contains("invalid_client"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(storage.get().await.is_err());
}
