//! Provider Discovery
//!
//! Retrieval of authorization server metadata (RFC 8414 / OpenID Connect
//! Discovery 1.0).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

use crate::core::transport::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{DiscoveryError, OAuth2Error, OAuth2Result};
use crate::types::{ProviderMetadata, DISCOVERY_TIMEOUT};

/// Discovery client interface (for dependency injection).
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Fetch the metadata document at `url`. The URL is used verbatim.
    async fn fetch(&self, url: &Url) -> OAuth2Result<ProviderMetadata>;
}

/// Default discovery client implementation.
pub struct DefaultDiscoveryClient<T: HttpTransport> {
    transport: T,
}

impl<T: HttpTransport> DefaultDiscoveryClient<T> {
    /// Create new discovery client.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: HttpTransport> DiscoveryClient for DefaultDiscoveryClient<T> {
    async fn fetch(&self, url: &Url) -> OAuth2Result<ProviderMetadata> {
        tracing::debug!(url = %url, "fetching provider metadata");

        let request = HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: [("accept".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            body: None,
            timeout: Some(DISCOVERY_TIMEOUT),
        };

        let response = self.transport.send(request).await.map_err(|e| {
            OAuth2Error::Discovery(DiscoveryError::Unreachable {
                url: url.to_string(),
                message: e.to_string(),
            })
        })?;

        if response.status >= 400 {
            return Err(DiscoveryError::InvalidResponse {
                url: url.to_string(),
                status: Some(response.status),
                message: format!("{}: {}", response.status_line(), response.body),
            }
            .into());
        }

        let metadata: ProviderMetadata = serde_json::from_str(&response.body).map_err(|e| {
            OAuth2Error::Discovery(DiscoveryError::InvalidResponse {
                url: url.to_string(),
                status: Some(response.status),
                message: format!("failed to decode metadata: {}", e),
            })
        })?;

        tracing::debug!(
            issuer = %metadata.issuer,
            token_endpoint = %metadata.token_endpoint,
            "provider metadata loaded"
        );

        Ok(metadata)
    }
}

/// Mock discovery client for testing.
#[derive(Default)]
pub struct MockDiscoveryClient {
    documents: Mutex<HashMap<String, ProviderMetadata>>,
    fetch_history: Mutex<Vec<String>>,
}

impl MockDiscoveryClient {
    /// Create new mock discovery client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document served at `url`.
    pub fn set_document(&self, url: &str, document: ProviderMetadata) -> &Self {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(url.to_string(), document);
        }
        self
    }

    /// Get fetch history.
    pub fn get_fetch_history(&self) -> Vec<String> {
        self.fetch_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DiscoveryClient for MockDiscoveryClient {
    async fn fetch(&self, url: &Url) -> OAuth2Result<ProviderMetadata> {
        if let Ok(mut history) = self.fetch_history.lock() {
            history.push(url.to_string());
        }

        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(url.as_str()).cloned())
            .ok_or_else(|| {
                DiscoveryError::Unreachable {
                    url: url.to_string(),
                    message: "no mock document".to_string(),
                }
                .into()
            })
    }
}
