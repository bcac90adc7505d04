//! OAuth2 Flows
//!
//! Grant implementations run by the token engine:
//!
//! - **Device Authorization Flow** (RFC 8628): For input-constrained devices
//! - **Client Credentials Flow** (RFC 6749 Section 4.4): For machine-to-machine authentication

pub mod client_credentials;
pub mod device;
pub mod polling;

// Client Credentials Flow
pub use client_credentials::{ClientCredentialsFlow, ClientCredentialsFlowImpl};

// Device Authorization Flow
pub use device::{classify_poll_response, DeviceAuthorizationFlow, DeviceAuthorizationFlowImpl};
pub use polling::{DevicePoller, MAX_POLL_LIFETIME, MIN_POLL_INTERVAL, SLOW_DOWN_INCREMENT};
