//! Client Credentials Flow
//!
//! RFC 6749 Section 4.4 - Client Credentials Grant.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::core::{encode_form, form_headers, join_scopes, HttpMethod, HttpRequest, HttpTransport};
use crate::error::{ConfigurationError, OAuth2Error, OAuth2Result};
use crate::types::{Config, GrantType, TokenResponse, TOKEN_REQUEST_TIMEOUT};

/// Client Credentials Flow interface.
#[async_trait]
pub trait ClientCredentialsFlow: Send + Sync {
    /// Request access token using client credentials. Not retried.
    async fn request_token(&self) -> OAuth2Result<TokenResponse>;
}

/// Client Credentials Flow implementation.
pub struct ClientCredentialsFlowImpl<T: HttpTransport> {
    config: Arc<Config>,
    transport: Arc<T>,
}

impl<T: HttpTransport> ClientCredentialsFlowImpl<T> {
    /// Create new Client Credentials Flow.
    pub fn new(config: Arc<Config>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    fn build_request_body(&self) -> OAuth2Result<String> {
        let secret = self
            .config
            .client_secret()
            .ok_or(ConfigurationError::MissingField {
                field: "client_secret",
            })?;

        let scope = join_scopes(self.config.scopes());
        let mut params = vec![
            ("grant_type", GrantType::ClientCredentials.as_str()),
            ("client_id", self.config.client_id()),
            ("client_secret", secret.expose_secret().as_str()),
            ("scope", scope.as_str()),
        ];
        if let Some(audience) = self.config.audience() {
            params.push(("audience", audience));
        }

        Ok(encode_form(&params))
    }
}

#[async_trait]
impl<T: HttpTransport> ClientCredentialsFlow for ClientCredentialsFlowImpl<T> {
    async fn request_token(&self) -> OAuth2Result<TokenResponse> {
        let endpoint = self.config.token_endpoint();
        tracing::debug!(endpoint = %endpoint, "requesting client credentials token");

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: endpoint.to_string(),
            headers: form_headers(),
            body: Some(self.build_request_body()?),
            timeout: Some(TOKEN_REQUEST_TIMEOUT),
        };

        let response = self.transport.send(request).await?;

        if response.status != 200 {
            return Err(OAuth2Error::HttpFailure {
                message: format!("token request failed: {}", response.status_line()),
                body: Some(response.body),
                source: None,
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&response.body).map_err(|e| OAuth2Error::InvalidResponse {
                message: format!("failed to decode token response: {}", e),
            })?;
        if token.access_token.is_empty() {
            return Err(OAuth2Error::MissingResponseData {
                field: "access_token",
            });
        }

        tracing::debug!(expires_in = ?token.expires_in, "client credentials token issued");
        Ok(token)
    }
}
