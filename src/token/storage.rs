//! Token Storage
//!
//! Persistence capability for the access token obtained by a grant.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{OAuth2Error, OAuth2Result, StorageError};

/// Token storage interface.
///
/// Holds at most one token. Implementations must be safe to share between
/// tasks.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Persist `token`, replacing any previous one.
    async fn set(&self, token: &str) -> OAuth2Result<()>;

    /// Retrieve the stored token. Fails with [`StorageError::TokenNotFound`]
    /// when nothing is stored.
    async fn get(&self) -> OAuth2Result<String>;

    /// Remove the stored token. Succeeds when nothing is stored.
    async fn delete(&self) -> OAuth2Result<()>;
}

/// In-memory token storage implementation.
#[derive(Default)]
pub struct InMemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl InMemoryTokenStorage {
    /// Create new in-memory token storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> OAuth2Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| OAuth2Error::internal("in-memory token storage lock poisoned"))
    }
}

#[async_trait]
impl TokenStorage for InMemoryTokenStorage {
    async fn set(&self, token: &str) -> OAuth2Result<()> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    async fn get(&self) -> OAuth2Result<String> {
        self.lock()?
            .clone()
            .ok_or(OAuth2Error::Storage(StorageError::TokenNotFound))
    }

    async fn delete(&self) -> OAuth2Result<()> {
        self.lock()?.take();
        Ok(())
    }
}

/// Storage operation recorded by [`MockTokenStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageCall {
    Set(String),
    Get,
    Delete,
}

/// Mock token storage for testing.
#[derive(Default)]
pub struct MockTokenStorage {
    inner: InMemoryTokenStorage,
    history: Mutex<Vec<StorageCall>>,
    next_error: Mutex<Option<OAuth2Error>>,
    should_fail: Mutex<bool>,
}

impl MockTokenStorage {
    /// Create new mock token storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: OAuth2Error) -> &Self {
        if let Ok(mut next) = self.next_error.lock() {
            *next = Some(error);
        }
        self
    }

    /// Set storage to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        if let Ok(mut flag) = self.should_fail.lock() {
            *flag = should_fail;
        }
        self
    }

    /// Get call history.
    pub fn get_history(&self) -> Vec<StorageCall> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: StorageCall) -> OAuth2Result<()> {
        let failure = match &call {
            StorageCall::Set(_) => StorageError::WriteFailed {
                message: "mock storage failure".to_string(),
            },
            StorageCall::Get => StorageError::ReadFailed {
                message: "mock storage failure".to_string(),
            },
            StorageCall::Delete => StorageError::DeleteFailed {
                message: "mock storage failure".to_string(),
            },
        };

        if let Ok(mut history) = self.history.lock() {
            history.push(call);
        }

        if self.should_fail.lock().map(|flag| *flag).unwrap_or(false) {
            return Err(failure.into());
        }

        match self.next_error.lock().ok().and_then(|mut next| next.take()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TokenStorage for MockTokenStorage {
    async fn set(&self, token: &str) -> OAuth2Result<()> {
        self.record(StorageCall::Set(token.to_string()))?;
        self.inner.set(token).await
    }

    async fn get(&self) -> OAuth2Result<String> {
        self.record(StorageCall::Get)?;
        self.inner.get().await
    }

    async fn delete(&self) -> OAuth2Result<()> {
        self.record(StorageCall::Delete)?;
        self.inner.delete().await
    }
}
