//! Device Code Polling
//!
//! Drives repeated token requests for a device authorization until a token
//! arrives, a terminal error occurs, the deadline passes, or the caller
//! cancels.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use super::DeviceAuthorizationFlow;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::{DeviceAuthorization, PollOutcome, TokenResponse};

/// Added to the polling interval on every `slow_down` answer (RFC 8628 Section 3.5).
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

/// Lower bound for the polling interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound for the polling deadline, whatever lifetime the provider reports.
pub const MAX_POLL_LIFETIME: Duration = Duration::from_secs(86400 * 365 * 30);

/// Polling state machine for the device authorization grant.
pub struct DevicePoller<F: DeviceAuthorizationFlow + ?Sized> {
    flow: Arc<F>,
    max_wait: Option<Duration>,
}

impl<F: DeviceAuthorizationFlow + ?Sized> DevicePoller<F> {
    /// Create a poller that exchanges codes through `flow`.
    pub fn new(flow: Arc<F>) -> Self {
        Self {
            flow,
            max_wait: None,
        }
    }

    /// Stop waiting after `max_wait` even if the device code is still valid.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Poll until the user completes authorization.
    ///
    /// The first request is sent immediately. No request is started once the
    /// deadline has passed, and both the in-flight request and the sleep
    /// between requests are interrupted by the deadline and by `cancel`.
    pub async fn poll(
        &self,
        authorization: &DeviceAuthorization,
        cancel: &CancellationToken,
    ) -> OAuth2Result<TokenResponse> {
        let started = Instant::now();
        let lifetime = match self.max_wait {
            Some(max_wait) => authorization.lifetime().min(max_wait),
            None => authorization.lifetime(),
        };
        let deadline = started + lifetime.min(MAX_POLL_LIFETIME);
        let mut interval = authorization.polling_interval().max(MIN_POLL_INTERVAL);
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(OAuth2Error::Cancelled);
            }
            if Instant::now() >= deadline {
                tracing::debug!(attempts, "device code deadline reached");
                return Err(OAuth2Error::TokenExpired {
                    elapsed: started.elapsed(),
                });
            }

            attempts += 1;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OAuth2Error::Cancelled),
                _ = sleep_until(deadline) => {
                    return Err(OAuth2Error::TokenExpired {
                        elapsed: started.elapsed(),
                    })
                }
                outcome = self.flow.poll_once(authorization) => outcome?,
            };

            match outcome {
                PollOutcome::Success(token) => {
                    tracing::info!(attempts, "device authorization completed");
                    return Ok(token);
                }
                PollOutcome::Pending => {
                    tracing::debug!(attempts, "authorization pending");
                }
                PollOutcome::SlowDown => {
                    interval = interval.saturating_add(SLOW_DOWN_INCREMENT);
                    tracing::debug!(attempts, interval = ?interval, "slow down requested");
                }
                PollOutcome::Expired => {
                    return Err(OAuth2Error::TokenExpired {
                        elapsed: started.elapsed(),
                    })
                }
                PollOutcome::Denied { error_description } => {
                    tracing::info!("device authorization denied");
                    return Err(OAuth2Error::UserDenied { error_description });
                }
            }

            let wake = Instant::now()
                .checked_add(interval)
                .map_or(deadline, |wake| wake.min(deadline));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OAuth2Error::Cancelled),
                _ = sleep_until(wake) => {}
            }
        }
    }
}
