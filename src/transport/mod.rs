//! HTTP transport abstraction and reqwest-backed implementations.
//!
//! The invocation core only requires a consistent status/headers/body shape
//! from its transport; everything wire-level (TLS, pooling, proxies) belongs
//! to the implementation behind the trait. Both an async and a blocking
//! form are offered so the dispatcher can expose matching sync/async
//! invocation paths over identical semantics.

use crate::errors::{RestError, RestResult};
use crate::request::BuiltRequest;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent sent by the bundled transports.
pub const DEFAULT_USER_AGENT: &str =
    concat!("integrations-restcore/", env!("CARGO_PKG_VERSION"));

/// Raw response as produced by a transport: status, header multimap and the
/// collected body bytes.
///
/// Collecting the body in the transport is what releases the underlying
/// connection back to the pool; consumers that do not care about the bytes
/// (HEAD, unit returns, error short-circuits) simply drop them.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    /// Creates a raw response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The undecoded body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the response, returning the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consumes the response, returning status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// Deferred-form HTTP transport.
///
/// Dropping the future returned by [`send`](HttpTransport::send) before it
/// completes aborts the in-flight network operation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a built request and collects the raw response.
    async fn send(&self, request: BuiltRequest) -> RestResult<RawResponse>;
}

/// Blocking-form HTTP transport.
pub trait BlockingHttpTransport: Send + Sync {
    /// Sends a built request, blocking the calling thread through I/O.
    fn send(&self, request: BuiltRequest) -> RestResult<RawResponse>;
}

/// Connection options for the bundled reqwest transports.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Total request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TransportOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection establishment timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the User-Agent header value.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Reqwest-based async transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with default options.
    pub fn new() -> RestResult<Self> {
        Self::with_options(TransportOptions::default())
    }

    /// Creates a transport with the given options.
    pub fn with_options(options: TransportOptions) -> RestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| RestError::transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: BuiltRequest) -> RestResult<RawResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(RawResponse::new(status, headers, body))
    }
}

/// Reqwest-based blocking transport.
pub struct BlockingReqwestTransport {
    client: reqwest::blocking::Client,
}

impl BlockingReqwestTransport {
    /// Creates a transport with default options.
    pub fn new() -> RestResult<Self> {
        Self::with_options(TransportOptions::default())
    }

    /// Creates a transport with the given options.
    pub fn with_options(options: TransportOptions) -> RestResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| RestError::transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl BlockingHttpTransport for BlockingReqwestTransport {
    fn send(&self, request: BuiltRequest) -> RestResult<RawResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;
        Ok(RawResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TransportOptions::new();
        assert_eq!(options.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(
            options.connect_timeout,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
        );
        assert!(options.user_agent.starts_with("integrations-restcore/"));
    }

    #[test]
    fn test_options_builder() {
        let options = TransportOptions::new()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(1))
            .user_agent("custom/1.0");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(1));
        assert_eq!(options.user_agent, "custom/1.0");
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn test_raw_response_parts() {
        let response = RawResponse::new(StatusCode::OK, HeaderMap::new(), "payload");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"payload");
        let (status, _, body) = response.into_parts();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"payload");
    }
}
