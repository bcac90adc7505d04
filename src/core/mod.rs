//! Core Infrastructure
//!
//! HTTP transport, provider discovery and request encoding.

pub mod discovery;
pub mod form;
pub mod transport;

pub use discovery::*;
pub use form::*;
pub use transport::*;
