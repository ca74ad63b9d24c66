//! Invocation dispatch.
//!
//! The pipeline is always build → transport → map, in that order, with the
//! build and map stages shared verbatim between the two execution forms:
//! [`Invoker`] defers the whole pipeline into a future (nothing runs until
//! it is polled, and dropping it aborts the in-flight transport call),
//! while [`BlockingInvoker`] runs it on the calling thread. Status
//! validation, encoding rules and error typing are therefore identical for
//! the sync and async forms of the same operation.

use crate::auth::AuthProvider;
use crate::descriptor::EndpointDescriptor;
use crate::errors::RestResult;
use crate::request::{self, BuiltRequest, CallArguments};
use crate::response::{self, ResponseEnvelope};
use crate::transport::{BlockingHttpTransport, HttpTransport, RawResponse};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Validates the declaration and builds the concrete request. Shared by
/// both execution forms; fails before any network traffic.
fn prepare(
    descriptor: &EndpointDescriptor,
    arguments: &CallArguments,
    auth: Option<&Arc<dyn AuthProvider>>,
) -> RestResult<BuiltRequest> {
    descriptor.validate()?;
    let mut built = request::build(descriptor, arguments)?;
    if let Some(provider) = auth {
        provider.apply(&mut built.headers)?;
    }
    debug!(
        operation = descriptor.operation,
        method = %built.method,
        url = %built.url,
        "sending request"
    );
    Ok(built)
}

fn observe(operation: &str, result: &RestResult<RawResponse>) {
    match result {
        Ok(response) => debug!(operation, status = response.status().as_u16(), "received response"),
        Err(error) => warn!(operation, %error, "transport failed"),
    }
}

/// Logs mapping failures before handing them to the caller.
fn traced<T>(operation: &str, result: RestResult<T>) -> RestResult<T> {
    if let Err(error) = &result {
        warn!(operation, %error, "invocation failed");
    }
    result
}

/// Deferred-form dispatcher.
pub struct Invoker {
    transport: Arc<dyn HttpTransport>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl Invoker {
    /// Creates a dispatcher over an async transport.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            auth: None,
        }
    }

    /// Attaches an auth-header provider applied to every request.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    async fn execute(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<RawResponse> {
        let built = prepare(descriptor, arguments, self.auth.as_ref())?;
        let result = self.transport.send(built).await;
        observe(descriptor.operation, &result);
        result
    }

    /// Invokes a unit-declared operation.
    pub async fn invoke_unit(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<()> {
        let response = self.execute(descriptor, arguments).await?;
        traced(descriptor.operation, response::map_unit(descriptor, response))
    }

    /// Invokes a raw-bytes-declared operation.
    pub async fn invoke_bytes(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<Bytes> {
        let response = self.execute(descriptor, arguments).await?;
        traced(descriptor.operation, response::map_bytes(descriptor, response))
    }

    /// Invokes a structurally-declared operation, decoding the body into `T`.
    pub async fn invoke_json<T: DeserializeOwned>(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<T> {
        let response = self.execute(descriptor, arguments).await?;
        traced(descriptor.operation, response::map_json(descriptor, response))
    }

    /// Invokes a wrapped-response operation with a structural body.
    pub async fn invoke_wrapped_json<T: DeserializeOwned>(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<ResponseEnvelope<T>> {
        let response = self.execute(descriptor, arguments).await?;
        traced(
            descriptor.operation,
            response::map_wrapped_json(descriptor, response),
        )
    }

    /// Invokes a wrapped-response operation around void.
    pub async fn invoke_wrapped_unit(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<ResponseEnvelope<()>> {
        let response = self.execute(descriptor, arguments).await?;
        traced(
            descriptor.operation,
            response::map_wrapped_unit(descriptor, response),
        )
    }
}

/// Blocking-form dispatcher.
pub struct BlockingInvoker {
    transport: Arc<dyn BlockingHttpTransport>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl BlockingInvoker {
    /// Creates a dispatcher over a blocking transport.
    pub fn new(transport: Arc<dyn BlockingHttpTransport>) -> Self {
        Self {
            transport,
            auth: None,
        }
    }

    /// Attaches an auth-header provider applied to every request.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    fn execute(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<RawResponse> {
        let built = prepare(descriptor, arguments, self.auth.as_ref())?;
        let result = self.transport.send(built);
        observe(descriptor.operation, &result);
        result
    }

    /// Invokes a unit-declared operation.
    pub fn invoke_unit(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<()> {
        let response = self.execute(descriptor, arguments)?;
        traced(descriptor.operation, response::map_unit(descriptor, response))
    }

    /// Invokes a raw-bytes-declared operation.
    pub fn invoke_bytes(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<Bytes> {
        let response = self.execute(descriptor, arguments)?;
        traced(descriptor.operation, response::map_bytes(descriptor, response))
    }

    /// Invokes a structurally-declared operation, decoding the body into `T`.
    pub fn invoke_json<T: DeserializeOwned>(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<T> {
        let response = self.execute(descriptor, arguments)?;
        traced(descriptor.operation, response::map_json(descriptor, response))
    }

    /// Invokes a wrapped-response operation with a structural body.
    pub fn invoke_wrapped_json<T: DeserializeOwned>(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<ResponseEnvelope<T>> {
        let response = self.execute(descriptor, arguments)?;
        traced(
            descriptor.operation,
            response::map_wrapped_json(descriptor, response),
        )
    }

    /// Invokes a wrapped-response operation around void.
    pub fn invoke_wrapped_unit(
        &self,
        descriptor: &EndpointDescriptor,
        arguments: &CallArguments,
    ) -> RestResult<ResponseEnvelope<()>> {
        let response = self.execute(descriptor, arguments)?;
        traced(
            descriptor.operation,
            response::map_wrapped_unit(descriptor, response),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticHeaderAuth;
    use crate::descriptor::ReturnShape;
    use crate::errors::RestError;
    use crate::fixtures;
    use crate::mocks::{MockHttpTransport, ScriptedTransport};
    use http::{HeaderMap, Method, StatusCode};
    use secrecy::SecretString;
    use serde_json::{json, Value};

    fn json_descriptor() -> EndpointDescriptor {
        EndpointDescriptor::new("widgets.get", Method::GET, "http://localhost", "/widgets/{id}")
            .with_returns(ReturnShape::Json)
    }

    fn ok_response(body: &str) -> RawResponse {
        RawResponse::new(StatusCode::OK, HeaderMap::new(), body.as_bytes().to_vec())
    }

    #[test]
    fn test_sync_and_async_forms_agree_on_success() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_response(
            format!("{}/widgets/7", fixtures::TEST_BASE_URL),
            ok_response(&fixtures::sample_widget_json().to_string()),
        );

        let desc = json_descriptor();
        let args = CallArguments::new().path_param("id", 7);

        let sync_result: RestResult<Value> =
            BlockingInvoker::new(transport.clone()).invoke_json(&desc, &args);
        let async_result: RestResult<Value> =
            tokio_test::block_on(Invoker::new(transport.clone()).invoke_json(&desc, &args));

        assert_eq!(sync_result.unwrap(), async_result.unwrap());
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn test_sync_and_async_forms_agree_on_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_response(
            format!("{}/widgets/7", fixtures::TEST_BASE_URL),
            RawResponse::new(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                fixtures::structured_error_body().to_string(),
            ),
        );

        let desc = json_descriptor();
        let args = CallArguments::new().path_param("id", 7);

        let sync_err = BlockingInvoker::new(transport.clone())
            .invoke_json::<Value>(&desc, &args)
            .unwrap_err();
        let async_err =
            tokio_test::block_on(Invoker::new(transport.clone()).invoke_json::<Value>(&desc, &args))
                .unwrap_err();

        // identical error variant and payload across the two forms
        assert_eq!(sync_err, async_err);
        match sync_err {
            RestError::Service { status, payload, .. } => {
                assert_eq!(status, 404);
                assert_eq!(payload["data"], json!("I'm the body!"));
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_async_pipeline_is_lazy() {
        let transport = Arc::new(ScriptedTransport::new());
        let invoker = Invoker::new(transport.clone());
        let desc = json_descriptor();
        let args = CallArguments::new().path_param("id", 1);

        let future = invoker.invoke_json::<Value>(&desc, &args);
        drop(future);

        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_unsupported_return_shape_fails_before_transport() {
        let transport = Arc::new(ScriptedTransport::new());
        let desc = EndpointDescriptor::new(
            "widgets.watch",
            Method::GET,
            "http://localhost",
            "/widgets",
        )
        .with_returns(ReturnShape::Stream);

        let err = BlockingInvoker::new(transport.clone())
            .invoke_unit(&desc, &CallArguments::new())
            .unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_auth_headers_applied() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_response("http://localhost/widgets/1", ok_response("{}"));

        let invoker = BlockingInvoker::new(transport.clone()).with_auth(Arc::new(
            StaticHeaderAuth::bearer(SecretString::new("tok".to_string())),
        ));
        let desc = json_descriptor();
        let args = CallArguments::new().path_param("id", 1);
        invoker.invoke_json::<Value>(&desc, &args).unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get("authorization").unwrap(),
            "Bearer tok"
        );
    }

    #[tokio::test]
    async fn test_transport_error_propagates_unmodified() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .returning(|_| Err(RestError::transport("connection refused")));

        let invoker = Invoker::new(Arc::new(mock));
        let desc = json_descriptor();
        let args = CallArguments::new().path_param("id", 1);

        let err = invoker.invoke_json::<Value>(&desc, &args).await.unwrap_err();
        assert_eq!(err, RestError::transport("connection refused"));
    }
}
