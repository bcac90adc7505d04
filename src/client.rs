//! OAuth2 Client
//!
//! High-level client that runs the configured grant and hands the resulting
//! token to the configured storage.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::{ConfigurationError, OAuth2Result};
use crate::flows::{
    ClientCredentialsFlow, ClientCredentialsFlowImpl, DeviceAuthorizationFlow,
    DeviceAuthorizationFlowImpl, DevicePoller,
};
use crate::types::{Config, DeviceAuthorization, GrantType, TokenResponse};

/// Shows the user code and verification URI to the user.
///
/// Called once per device login, after the device code is issued and before
/// polling starts.
pub trait VerificationHandler: Send + Sync {
    fn on_verification(&self, authorization: &DeviceAuthorization);
}

impl<F> VerificationHandler for F
where
    F: Fn(&DeviceAuthorization) + Send + Sync,
{
    fn on_verification(&self, authorization: &DeviceAuthorization) {
        self(authorization)
    }
}

/// OAuth2 client for a single validated configuration.
pub struct OAuth2Client<T: HttpTransport = ReqwestHttpTransport> {
    config: Arc<Config>,
    transport: Arc<T>,
    max_wait: Option<Duration>,
}

impl OAuth2Client<ReqwestHttpTransport> {
    /// Create a new OAuth2 client with the default transport.
    pub fn new(config: Config) -> OAuth2Result<Self> {
        let transport = Arc::new(ReqwestHttpTransport::new()?);
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport> OAuth2Client<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: Config, transport: Arc<T>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            max_wait: None,
        }
    }

    /// Give up device polling after `max_wait`, even if the device code
    /// lives longer.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn device_flow(&self) -> DeviceAuthorizationFlowImpl<T> {
        DeviceAuthorizationFlowImpl::new(Arc::clone(&self.config), Arc::clone(&self.transport))
    }

    // ========== Device Authorization Flow ==========

    /// Request device and user codes.
    pub async fn request_device_code(&self) -> OAuth2Result<DeviceAuthorization> {
        self.device_flow().request_device_code().await
    }

    /// Poll until the user approves, denies, the code expires, or `cancel`
    /// fires.
    pub async fn poll_for_token(
        &self,
        authorization: &DeviceAuthorization,
        cancel: &CancellationToken,
    ) -> OAuth2Result<TokenResponse> {
        let mut poller = DevicePoller::new(Arc::new(self.device_flow()));
        if let Some(max_wait) = self.max_wait {
            poller = poller.with_max_wait(max_wait);
        }
        poller.poll(authorization, cancel).await
    }

    // ========== Client Credentials Flow ==========

    /// Request a token with the client credentials grant.
    pub async fn client_credentials_token(&self) -> OAuth2Result<TokenResponse> {
        ClientCredentialsFlowImpl::new(Arc::clone(&self.config), Arc::clone(&self.transport))
            .request_token()
            .await
    }

    // ========== Token Lifecycle ==========

    /// Run the configured grant and store the access token.
    pub async fn login<H>(
        &self,
        handler: &H,
        cancel: &CancellationToken,
    ) -> OAuth2Result<TokenResponse>
    where
        H: VerificationHandler + ?Sized,
    {
        let token = match self.config.grant_type() {
            GrantType::DeviceCode => {
                let authorization = self.request_device_code().await?;
                handler.on_verification(&authorization);
                self.poll_for_token(&authorization, cancel).await?
            }
            GrantType::ClientCredentials => self.client_credentials_token().await?,
            other => {
                return Err(ConfigurationError::UnsupportedGrantType {
                    grant_type: other.to_string(),
                }
                .into())
            }
        };

        self.config.storage().set(&token.access_token).await?;
        tracing::info!(
            grant_type = %self.config.grant_type(),
            client_id = %self.config.client_id(),
            "login succeeded"
        );

        Ok(token)
    }

    /// Read the stored access token.
    pub async fn stored_token(&self) -> OAuth2Result<String> {
        self.config.storage().get().await
    }

    /// Remove the stored access token.
    pub async fn logout(&self) -> OAuth2Result<()> {
        self.config.storage().delete().await?;
        tracing::info!(client_id = %self.config.client_id(), "logged out");
        Ok(())
    }
}
