//! HTTP Transport
//!
//! HTTP client interface and implementations for provider requests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{OAuth2Error, OAuth2Result};

/// Largest response body accepted from a provider.
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// HTTP request definition.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// HTTP response definition.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text.
    pub status_text: String,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Status line such as `401 Unauthorized`.
    pub fn status_line(&self) -> String {
        if self.status_text.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.status_text)
        }
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request. Transport-level failures (DNS, TLS, refused
    /// connections, timeouts) map to [`OAuth2Error::HttpFailure`].
    async fn send(&self, request: HttpRequest) -> OAuth2Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> OAuth2Result<HttpResponse> {
        (**self).send(request).await
    }
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
    max_response_size: usize,
}

impl ReqwestHttpTransport {
    /// Create new transport with default settings.
    pub fn new() -> OAuth2Result<Self> {
        Self::with_options(Duration::from_secs(30), MAX_RESPONSE_SIZE)
    }

    /// Create transport with custom options.
    pub fn with_options(timeout: Duration, max_response_size: usize) -> OAuth2Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| OAuth2Error::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_timeout: timeout,
            max_response_size,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> OAuth2Result<HttpResponse> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.timeout(timeout).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("request to {} timed out after {:?}", request.url, timeout)
            } else if e.is_connect() {
                format!("connection to {} failed", request.url)
            } else if e.is_builder() {
                return OAuth2Error::internal(format!("failed to create HTTP request: {}", e));
            } else {
                format!("request to {} failed", request.url)
            };
            OAuth2Error::HttpFailure {
                message,
                body: None,
                source: Some(Box::new(e)),
            }
        })?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string();

        if let Some(len) = response.content_length() {
            if len as usize > self.max_response_size {
                return Err(OAuth2Error::InvalidResponse {
                    message: format!("response too large: {} bytes", len),
                });
            }
        }

        let body = response.text().await.map_err(|e| OAuth2Error::HttpFailure {
            message: format!("failed to read response body from {}", request.url),
            body: None,
            source: Some(Box::new(e)),
        })?;

        if body.len() > self.max_response_size {
            return Err(OAuth2Error::InvalidResponse {
                message: format!("response too large: {} bytes", body.len()),
            });
        }

        Ok(HttpResponse {
            status,
            status_text,
            body,
        })
    }
}

/// Request captured by [`MockHttpTransport`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub request: HttpRequest,
    /// Time the request reached the transport.
    pub sent_at: Instant,
}

/// Mock HTTP transport for testing. Responses are returned in the order they
/// were queued.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    request_history: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<HttpResponse>>,
    response_delay: Mutex<Option<Duration>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, status: u16, body: impl Into<String>) -> &Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(mock_response(status, body.into()));
        }
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response(&self, status: u16, body: &serde_json::Value) -> &Self {
        self.queue_response(status, body.to_string())
    }

    /// Set default response when queue is empty.
    pub fn set_default_response(&self, status: u16, body: impl Into<String>) -> &Self {
        if let Ok(mut default) = self.default_response.lock() {
            *default = Some(mock_response(status, body.into()));
        }
        self
    }

    /// Delay every response by the given duration.
    pub fn set_response_delay(&self, delay: Duration) -> &Self {
        if let Ok(mut current) = self.response_delay.lock() {
            *current = Some(delay);
        }
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.request_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.request_history
            .lock()
            .map(|history| history.len())
            .unwrap_or_default()
    }
}

fn mock_response(status: u16, body: String) -> HttpResponse {
    HttpResponse {
        status,
        status_text: reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string(),
        body,
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> OAuth2Result<HttpResponse> {
        if let Ok(mut history) = self.request_history.lock() {
            history.push(RecordedRequest {
                request,
                sent_at: Instant::now(),
            });
        }

        let delay = self.response_delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        let response = queued.or_else(|| {
            self.default_response
                .lock()
                .ok()
                .and_then(|default| default.clone())
        });

        response.ok_or_else(|| OAuth2Error::http_failure("no mock response available"))
    }
}
