//! Mock implementations for testing.
//!
//! [`ScriptedTransport`] serves canned responses keyed by URL through both
//! the async and blocking transport traits, so matched sync/async test
//! pairs exercise literally the same wire-level behavior.

use crate::errors::{RestError, RestResult};
use crate::request::BuiltRequest;
use crate::transport::{BlockingHttpTransport, HttpTransport, RawResponse};
use async_trait::async_trait;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Mutex;

/// Transport serving scripted responses keyed by request URL.
///
/// Every request is recorded for later assertions, whichever trait it
/// arrived through.
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, RestResult<RawResponse>>>,
    requests: Mutex<Vec<BuiltRequest>>,
}

impl ScriptedTransport {
    /// Creates an empty scripted transport.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Scripts a response for a URL.
    pub fn script_response(&self, url: impl Into<String>, response: RawResponse) {
        self.responses.lock().unwrap().insert(url.into(), Ok(response));
    }

    /// Scripts a transport failure for a URL.
    pub fn script_error(&self, url: impl Into<String>, error: RestError) {
        self.responses.lock().unwrap().insert(url.into(), Err(error));
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The requests served so far, in arrival order.
    pub fn requests(&self) -> Vec<BuiltRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn lookup(&self, request: BuiltRequest) -> RestResult<RawResponse> {
        let url = request.url.to_string();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| {
                Err(RestError::transport(format!(
                    "no scripted response for URL: {}",
                    url
                )))
            })
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: BuiltRequest) -> RestResult<RawResponse> {
        self.lookup(request)
    }
}

impl BlockingHttpTransport for ScriptedTransport {
    fn send(&self, request: BuiltRequest) -> RestResult<RawResponse> {
        self.lookup(request)
    }
}

// Mockall-based mocks for expectation-style tests
mock! {
    pub HttpTransport {}

    #[async_trait]
    impl HttpTransport for HttpTransport {
        async fn send(&self, request: BuiltRequest) -> RestResult<RawResponse>;
    }
}

mock! {
    pub BlockingHttpTransport {}

    impl BlockingHttpTransport for BlockingHttpTransport {
        fn send(&self, request: BuiltRequest) -> RestResult<RawResponse>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode};
    use url::Url;

    fn request(url: &str) -> BuiltRequest {
        BuiltRequest {
            method: Method::GET,
            url: Url::parse(url).unwrap(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_response_served_on_both_traits() {
        let transport = ScriptedTransport::new();
        transport.script_response(
            "http://localhost/test",
            RawResponse::new(StatusCode::OK, HeaderMap::new(), "payload"),
        );

        let via_async = HttpTransport::send(&transport, request("http://localhost/test"))
            .await
            .unwrap();
        let via_blocking =
            BlockingHttpTransport::send(&transport, request("http://localhost/test")).unwrap();

        assert_eq!(via_async.body(), via_blocking.body());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_unscripted_url_is_transport_error() {
        let transport = ScriptedTransport::new();
        let err = HttpTransport::send(&transport, request("http://localhost/missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::Transport { .. }));
    }

    #[test]
    fn test_scripted_error() {
        let transport = ScriptedTransport::new();
        transport.script_error("http://localhost/down", RestError::transport("boom"));
        let err =
            BlockingHttpTransport::send(&transport, request("http://localhost/down")).unwrap_err();
        assert_eq!(err, RestError::transport("boom"));
    }
}
