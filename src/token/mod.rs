//! Token Persistence
//!
//! Storage backends for the obtained access token.

#[cfg(feature = "keyring")]
pub mod keyring;
pub mod storage;

#[cfg(feature = "keyring")]
pub use self::keyring::KeyringTokenStorage;
pub use storage::{InMemoryTokenStorage, MockTokenStorage, StorageCall, TokenStorage};
