//! OAuth2 Types
//!
//! Core type definitions for token acquisition.

pub mod config;
pub mod device;
pub mod discovery;
pub mod grant;
pub mod token;

pub use config::*;
pub use device::*;
pub use discovery::*;
pub use grant::*;
pub use token::*;
