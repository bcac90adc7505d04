//! Device Authorization Flow
//!
//! RFC 8628 - OAuth 2.0 Device Authorization Grant. This module performs the
//! individual exchanges; [`DevicePoller`](super::DevicePoller) drives the
//! polling loop.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::core::{
    encode_form, form_headers, join_scopes, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
};
use crate::error::{parse_error_response, ConfigurationError, OAuth2Error, OAuth2Result};
use crate::types::{
    Config, DeviceAuthorization, GrantType, PollOutcome, TokenResponse, DEVICE_CODE_TIMEOUT,
    TOKEN_REQUEST_TIMEOUT,
};

/// Device Authorization Flow interface.
#[async_trait]
pub trait DeviceAuthorizationFlow: Send + Sync {
    /// Request device and user codes. Called once per login attempt.
    async fn request_device_code(&self) -> OAuth2Result<DeviceAuthorization>;

    /// Exchange the device code for a token once.
    ///
    /// Pending and slow-down answers come back as [`PollOutcome`] values;
    /// only protocol violations and transport failures are errors.
    async fn poll_once(&self, authorization: &DeviceAuthorization) -> OAuth2Result<PollOutcome>;
}

/// Device Authorization Flow implementation.
pub struct DeviceAuthorizationFlowImpl<T: HttpTransport> {
    config: Arc<Config>,
    transport: Arc<T>,
}

impl<T: HttpTransport> DeviceAuthorizationFlowImpl<T> {
    /// Create new Device Authorization Flow.
    pub fn new(config: Arc<Config>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    fn build_device_code_request_body(&self) -> String {
        let scope = join_scopes(self.config.scopes());
        let mut params = vec![
            ("client_id", self.config.client_id()),
            ("scope", scope.as_str()),
        ];
        if let Some(audience) = self.config.audience() {
            params.push(("audience", audience));
        }
        if let Some(secret) = self.config.client_secret() {
            params.push(("client_secret", secret.expose_secret().as_str()));
        }
        encode_form(&params)
    }

    fn build_token_request_body(&self, authorization: &DeviceAuthorization) -> String {
        let mut params = vec![
            ("grant_type", GrantType::DeviceCode.as_str()),
            ("device_code", authorization.device_code().expose_secret().as_str()),
            ("client_id", self.config.client_id()),
        ];
        if let Some(secret) = self.config.client_secret() {
            params.push(("client_secret", secret.expose_secret().as_str()));
        }
        encode_form(&params)
    }
}

#[async_trait]
impl<T: HttpTransport> DeviceAuthorizationFlow for DeviceAuthorizationFlowImpl<T> {
    async fn request_device_code(&self) -> OAuth2Result<DeviceAuthorization> {
        let endpoint = self.config.device_authorization_endpoint().ok_or(
            ConfigurationError::MissingField {
                field: "device_authorization_endpoint",
            },
        )?;

        tracing::debug!(endpoint = %endpoint, "requesting device code");

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: endpoint.to_string(),
            headers: form_headers(),
            body: Some(self.build_device_code_request_body()),
            timeout: Some(DEVICE_CODE_TIMEOUT),
        };

        let response = self.transport.send(request).await?;

        match response.status {
            200 => {
                let authorization = DeviceAuthorization::from_json(&response.body)?;
                tracing::debug!(
                    user_code = %authorization.user_code,
                    expires_in = authorization.expires_in,
                    interval = ?authorization.interval,
                    "device code issued"
                );
                Ok(authorization)
            }
            400 => Err(OAuth2Error::InvalidScope {
                body: response.body,
            }),
            401 => Err(ConfigurationError::ClientRejected {
                body: response.body,
            }
            .into()),
            status => Err(OAuth2Error::UnexpectedStatus {
                status,
                body: response.body,
            }),
        }
    }

    async fn poll_once(&self, authorization: &DeviceAuthorization) -> OAuth2Result<PollOutcome> {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.config.token_endpoint().to_string(),
            headers: form_headers(),
            body: Some(self.build_token_request_body(authorization)),
            timeout: Some(TOKEN_REQUEST_TIMEOUT),
        };

        let response = self.transport.send(request).await?;
        classify_poll_response(response)
    }
}

/// Interpret a token endpoint response received while polling.
///
/// A JSON `error` field takes precedence over the status code, and any code
/// outside the RFC 8628 polling set is a hard failure. Without one, 401
/// counts as pending and 403 as slow-down.
pub fn classify_poll_response(response: HttpResponse) -> OAuth2Result<PollOutcome> {
    if response.status == 200 {
        let token: TokenResponse =
            serde_json::from_str(&response.body).map_err(|e| OAuth2Error::InvalidResponse {
                message: format!("failed to decode token response: {}", e),
            })?;
        if token.access_token.is_empty() {
            return Err(OAuth2Error::MissingResponseData {
                field: "access_token",
            });
        }
        return Ok(PollOutcome::Success(token));
    }

    if let Some(error) = parse_error_response(&response.body).filter(|e| !e.error.is_empty()) {
        return match error.error.as_str() {
            "authorization_pending" => Ok(PollOutcome::Pending),
            "slow_down" => Ok(PollOutcome::SlowDown),
            "expired_token" => Ok(PollOutcome::Expired),
            "access_denied" => Ok(PollOutcome::Denied {
                error_description: error.error_description,
            }),
            code => {
                tracing::debug!(error = code, status = response.status, "token request rejected");
                Err(OAuth2Error::InvalidTokenResponse {
                    body: response.body,
                })
            }
        };
    }

    match response.status {
        401 => Ok(PollOutcome::Pending),
        403 => Ok(PollOutcome::SlowDown),
        400 => Err(OAuth2Error::InvalidTokenResponse {
            body: response.body,
        }),
        status => Err(OAuth2Error::UnexpectedStatus {
            status,
            body: response.body,
        }),
    }
}
