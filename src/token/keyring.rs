//! Keychain Token Storage
//!
//! Stores the token in the OS credential manager:
//!
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{OAuth2Error, OAuth2Result, StorageError};
use crate::token::TokenStorage;

/// Token storage backed by a single keychain entry.
///
/// The entry's service and account are both the configured service name,
/// which is normally the OAuth2 client id.
pub struct KeyringTokenStorage {
    service: String,
    entry: Arc<keyring::Entry>,
}

impl KeyringTokenStorage {
    /// Open the keychain entry for `service`.
    pub fn new(service: impl Into<String>) -> OAuth2Result<Self> {
        let service = service.into();
        let entry = keyring::Entry::new(&service, &service).map_err(|e| {
            OAuth2Error::internal(format!("failed to open keychain entry {}: {}", service, e))
        })?;

        Ok(Self {
            service,
            entry: Arc::new(entry),
        })
    }

    /// Service name the token is stored under.
    pub fn service(&self) -> &str {
        &self.service
    }

    async fn run<R, F>(&self, op: F) -> OAuth2Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&keyring::Entry) -> OAuth2Result<R> + Send + 'static,
    {
        let entry = Arc::clone(&self.entry);
        tokio::task::spawn_blocking(move || op(entry.as_ref()))
            .await
            .map_err(|e| OAuth2Error::internal(format!("keychain task failed: {}", e)))?
    }
}

#[async_trait]
impl TokenStorage for KeyringTokenStorage {
    async fn set(&self, token: &str) -> OAuth2Result<()> {
        tracing::debug!(service = %self.service, "storing token in keychain");
        let token = token.to_string();
        self.run(move |entry| {
            entry.set_password(&token).map_err(|e| {
                StorageError::WriteFailed {
                    message: e.to_string(),
                }
                .into()
            })
        })
        .await
    }

    async fn get(&self) -> OAuth2Result<String> {
        self.run(|entry| match entry.get_password() {
            Ok(token) => Ok(token),
            Err(keyring::Error::NoEntry) => Err(StorageError::TokenNotFound.into()),
            Err(e) => Err(StorageError::ReadFailed {
                message: e.to_string(),
            }
            .into()),
        })
        .await
    }

    async fn delete(&self) -> OAuth2Result<()> {
        tracing::debug!(service = %self.service, "removing token from keychain");
        self.run(|entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed {
                message: e.to_string(),
            }
            .into()),
        })
        .await
    }
}
