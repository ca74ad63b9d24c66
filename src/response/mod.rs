//! Response mapping.
//!
//! Validates the response status against the operation's declared
//! expectations and decodes the body according to the declared return
//! shape. Mapping is purely computational; the body bytes are consumed on
//! every exit path, success or failure.

use crate::descriptor::{EndpointDescriptor, ErrorShape, ReturnShape, WrappedBody};
use crate::errors::{CloudError, RestError, RestResult};
use crate::transport::RawResponse;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;

/// A decoded response with its wire-level context: status, headers and an
/// optional decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope<T> {
    /// The response status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The decoded body, absent for unit declarations, HEAD responses and
    /// empty bodies.
    pub body: Option<T>,
}

/// Maps a unit-declared response: the body is drained and discarded.
pub fn map_unit(descriptor: &EndpointDescriptor, response: RawResponse) -> RestResult<()> {
    check_shape(descriptor, ReturnShape::Unit)?;
    let response = check_status(descriptor, response)?;
    let _ = response.into_body();
    Ok(())
}

/// Maps a raw-bytes-declared response: the undecoded body is returned.
pub fn map_bytes(descriptor: &EndpointDescriptor, response: RawResponse) -> RestResult<Bytes> {
    check_shape(descriptor, ReturnShape::Bytes)?;
    let response = check_status(descriptor, response)?;
    Ok(response.into_body())
}

/// Maps a structurally-declared response: the body is deserialized into `T`.
pub fn map_json<T: DeserializeOwned>(
    descriptor: &EndpointDescriptor,
    response: RawResponse,
) -> RestResult<T> {
    check_shape(descriptor, ReturnShape::Json)?;
    let response = check_status(descriptor, response)?;
    serde_json::from_slice(&response.into_body()).map_err(RestError::from)
}

/// Maps a wrapped-response declaration around a structural body.
///
/// HEAD responses and empty bodies report `None` as the body value.
pub fn map_wrapped_json<T: DeserializeOwned>(
    descriptor: &EndpointDescriptor,
    response: RawResponse,
) -> RestResult<ResponseEnvelope<T>> {
    check_shape(descriptor, ReturnShape::Wrapped(WrappedBody::Json))?;
    let response = check_status(descriptor, response)?;
    let (status, headers, body) = response.into_parts();
    let body = if descriptor.method == Method::HEAD || body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body)?)
    };
    Ok(ResponseEnvelope {
        status,
        headers,
        body,
    })
}

/// Maps a wrapped-response declaration around void: the body is drained and
/// reported as absent.
pub fn map_wrapped_unit(
    descriptor: &EndpointDescriptor,
    response: RawResponse,
) -> RestResult<ResponseEnvelope<()>> {
    check_shape(descriptor, ReturnShape::Wrapped(WrappedBody::Unit))?;
    let response = check_status(descriptor, response)?;
    let (status, headers, body) = response.into_parts();
    let _ = body;
    Ok(ResponseEnvelope {
        status,
        headers,
        body: None,
    })
}

/// Rejects a mapping entry point that disagrees with the declared shape.
///
/// Unit mapping is additionally accepted for any HEAD operation, whose
/// result is void regardless of the declared wrapping.
fn check_shape(descriptor: &EndpointDescriptor, requested: ReturnShape) -> RestResult<()> {
    if descriptor.returns == requested {
        return Ok(());
    }
    if requested == ReturnShape::Unit && descriptor.method == Method::HEAD {
        return Ok(());
    }
    Err(RestError::configuration(
        descriptor.operation,
        format!(
            "declared return shape is `{}` but the result was requested as `{}`",
            descriptor.returns, requested
        ),
    ))
}

/// Validates the status code, consuming the body into an error payload when
/// the status falls outside the operation's expectations.
fn check_status(
    descriptor: &EndpointDescriptor,
    response: RawResponse,
) -> RestResult<RawResponse> {
    let status = response.status().as_u16();
    if descriptor.expects(status) {
        return Ok(response);
    }

    // Error path: the body is always consumed, even when the decoded
    // payload ends up discarded by the caller.
    let body = response.into_body();
    let payload = decode_error_payload(&body);
    let cloud = match descriptor.error_shape {
        ErrorShape::Cloud => decode_cloud(&payload),
        ErrorShape::Structured => None,
    };
    Err(RestError::Service {
        operation: descriptor.operation.to_string(),
        status,
        payload,
        cloud,
    })
}

/// Decodes an error body into a structural payload. Non-JSON bodies are
/// kept as a string; empty bodies become `null`.
fn decode_error_payload(body: &Bytes) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(String::from_utf8_lossy(body).into_owned()),
    }
}

/// Decodes the typed cloud error detail from either the enveloped form
/// (`{"error": {...}}`) or a bare error object.
fn decode_cloud(payload: &serde_json::Value) -> Option<CloudError> {
    let candidate = payload.get("error").unwrap_or(payload);
    let cloud: CloudError = serde_json::from_value(candidate.clone()).ok()?;
    if cloud.code.is_none() && cloud.message.is_none() {
        return None;
    }
    Some(cloud)
}
