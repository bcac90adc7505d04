//! Integration tests for the device authorization flow

use super::*;
use oauth2_cli::{
    Config, ConfigurationError, DefaultDiscoveryClient, DeviceAuthorization, InMemoryTokenStorage,
    OAuth2Client, OAuth2Error, TokenStorage,
};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header};

fn device_code_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "device_code": "d1",
        "user_code": "U1",
        "verification_uri": "https://ex/verify",
        "expires_in": 600,
        "interval": 5
    }))
}

fn token_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "tok",
        "token_type": "bearer",
        "expires_in": 3600
    }))
}

#[tokio::test]
async fn test_device_login_end_to_end() {
    let server = setup_mock_server().await;
    mount_discovery(&server).await;

    Mock::given(method("POST"))
        .and(path("/device"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("client_id=cli"))
        .and(body_string_contains("scope=openid+profile+email"))
        .respond_with(device_code_response())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("device_code=d1"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Adevice_code",
        ))
        .respond_with(token_response())
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport();
    let storage = Arc::new(InMemoryTokenStorage::new());
    let discovery = DefaultDiscoveryClient::new(Arc::clone(&transport));
    let config = Config::builder()
        .discover(&discovery, &discovery_url(&server))
        .await
        .client_id("cli")
        .storage(storage.clone())
        .build()
        .unwrap();

    let shown = Mutex::new(None);
    let handler = |authorization: &DeviceAuthorization| {
        *shown.lock().unwrap() = Some(authorization.user_code.clone());
    };

    let client = OAuth2Client::with_transport(config, transport);
    let token = client
        .login(&handler, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(token.access_token, "tok");
    assert_eq!(storage.get().await.unwrap(), "tok");
    assert_eq!(shown.lock().unwrap().as_deref(), Some("U1"));
}

#[tokio::test]
async fn test_device_login_pending_then_success() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "d1",
            "user_code": "U1",
            "verification_uri": "https://ex/verify",
            "expires_in": 600,
            "interval": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "authorization_pending"})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response())
        .with_priority(2)
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryTokenStorage::new());
    let config = Config::builder()
        .client_id("cli")
        .device_authorization_endpoint(format!("{}/device", server.uri()))
        .token_endpoint(format!("{}/token", server.uri()))
        .storage(storage.clone())
        .build()
        .unwrap();

    let client = OAuth2Client::with_transport(config, transport());
    let started = std::time::Instant::now();
    client
        .login(&|_: &DeviceAuthorization| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() >= std::time::Duration::from_secs(1));
    assert_eq!(storage.get().await.unwrap(), "tok");

    let token_requests = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == "/token")
        .count();
    assert_eq!(token_requests, 2);
}

#[tokio::test]
async fn test_device_login_denied() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(device_code_response())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "access_denied",
            "error_description": "The user denied the request"
        })))
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryTokenStorage::new());
    let config = Config::builder()
        .client_id("cli")
        .device_authorization_endpoint(format!("{}/device", server.uri()))
        .token_endpoint(format!("{}/token", server.uri()))
        .storage(storage.clone())
        .build()
        .unwrap();

    let client = OAuth2Client::with_transport(config, transport());
    let err = client
        .login(&|_: &DeviceAuthorization| {}, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        OAuth2Error::UserDenied { error_description } => assert_eq!(
            error_description.as_deref(),
            Some("The user denied the request")
        ),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(storage.get().await.is_err());
}

#[tokio::test]
async fn test_device_code_rejected_client() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .mount(&server)
        .await;

    let config = Config::builder()
        .client_id("unknown")
        .device_authorization_endpoint(format!("{}/device", server.uri()))
        .token_endpoint(format!("{}/token", server.uri()))
        .storage(Arc::new(InMemoryTokenStorage::new()))
        .build()
        .unwrap();

    let client = OAuth2Client::with_transport(config, transport());
    let err = client.request_device_code().await.unwrap_err();

    assert!(matches!(
        err,
        OAuth2Error::InvalidConfig(ConfigurationError::ClientRejected { .. })
    ));
}

#[tokio::test]
async fn test_manual_endpoints_after_failed_discovery() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(device_code_response())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response())
        .mount(&server)
        .await;

    let transport = transport();
    let discovery = DefaultDiscoveryClient::new(Arc::clone(&transport));
    let storage = Arc::new(InMemoryTokenStorage::new());
    let config = Config::builder()
        .discover(&discovery, &discovery_url(&server))
        .await
        .client_id("cli")
        .device_authorization_endpoint(format!("{}/device", server.uri()))
        .token_endpoint(format!("{}/token", server.uri()))
        .storage(storage.clone())
        .build()
        .unwrap();

    let client = OAuth2Client::with_transport(config, transport);
    client
        .login(&|_: &DeviceAuthorization| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(storage.get().await.unwrap(), "tok");
}
