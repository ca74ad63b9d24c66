//! Request building.
//!
//! Turns an [`EndpointDescriptor`] plus per-call [`CallArguments`] into a
//! concrete [`BuiltRequest`]: resolved absolute URL, headers and an optional
//! encoded body. Building is purely computational; nothing here touches the
//! network.

use crate::descriptor::EndpointDescriptor;
use crate::errors::{RestError, RestResult};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use url::Url;

/// Characters percent-encoded in path segments.
///
/// `%` is in the set, so a default-mode value that already contains `%20`
/// comes out as `%2520`; callers who pre-encode must mark the parameter
/// pre-encoded to pass it through verbatim. `+` is deliberately not in the
/// set, so values containing a literal `+` survive path resolution.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// Characters percent-encoded in query names and default-mode query values.
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'%')
    .add(b'&')
    .add(b'=')
    .add(b'+');

/// Whether a parameter value is percent-encoded at build time or passed
/// through verbatim because the caller already encoded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Percent-encode the value at build time.
    Encode,
    /// Insert the value verbatim; the caller guarantees valid encoding.
    PreEncoded,
}

/// Request body, categorized by content type.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Opaque octets, sent as `application/octet-stream`.
    Octets(Bytes),
    /// Structural value, serialized and sent as `application/json`.
    Json(serde_json::Value),
}

/// Concrete values supplied at call time, keyed by parameter role.
#[derive(Debug, Clone, Default)]
pub struct CallArguments {
    host: Vec<(String, String)>,
    path: Vec<(String, String, Encoding)>,
    query: Vec<(String, String, Encoding)>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
}

impl CallArguments {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies a value for a host template placeholder. Host parts are
    /// inserted verbatim.
    pub fn host_part(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.host.push((name.into(), value.to_string()));
        self
    }

    /// Supplies a path placeholder value, percent-encoded at build time.
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path
            .push((name.into(), value.to_string(), Encoding::Encode));
        self
    }

    /// Supplies an already-encoded path placeholder value, inserted verbatim.
    pub fn path_param_pre_encoded(
        mut self,
        name: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.path
            .push((name.into(), value.to_string(), Encoding::PreEncoded));
        self
    }

    /// Appends a query parameter, percent-encoded at build time. Call-site
    /// order is preserved in the query string.
    pub fn query_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query
            .push((name.into(), value.to_string(), Encoding::Encode));
        self
    }

    /// Appends an already-encoded query parameter, inserted verbatim.
    pub fn query_param_pre_encoded(
        mut self,
        name: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.query
            .push((name.into(), value.to_string(), Encoding::PreEncoded));
        self
    }

    /// Sets a header value. Repeating a name appends another entry rather
    /// than replacing the first.
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    /// Sets a structural body, serialized as JSON at build time.
    pub fn json_body<T: Serialize>(mut self, body: &T) -> RestResult<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Sets an opaque octet-stream body.
    pub fn octet_body(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Octets(bytes.into()));
        self
    }
}

/// A fully resolved request, ready for the transport. Single-owner and
/// consumed exactly once.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    /// HTTP verb.
    pub method: Method,
    /// Resolved absolute URL.
    pub url: Url,
    /// Header multimap. Names are case-insensitive, insertion order is
    /// preserved per name, duplicates are allowed.
    pub headers: HeaderMap,
    /// Encoded body, if any.
    pub body: Option<Bytes>,
}

impl BuiltRequest {
    /// Returns every discrete value for `name`: duplicate header entries
    /// are enumerated in insertion order, and each stored value is split
    /// on unescaped commas.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(split_header_values)
            .collect()
    }
}

/// Builds a concrete request from an operation's descriptor and the values
/// supplied at call time.
pub fn build(descriptor: &EndpointDescriptor, arguments: &CallArguments) -> RestResult<BuiltRequest> {
    let operation = descriptor.operation;

    // Host placeholders substitute verbatim, each independently.
    let mut host = descriptor.host.to_string();
    for (name, value) in &arguments.host {
        host = host.replace(&placeholder(name), value);
    }
    ensure_resolved(operation, "host template", &host)?;

    let mut path = descriptor.path.to_string();
    for (name, value, encoding) in &arguments.path {
        let substituted = match encoding {
            Encoding::Encode => utf8_percent_encode(value, PATH_ENCODE_SET).to_string(),
            Encoding::PreEncoded => value.clone(),
        };
        path = path.replace(&placeholder(name), &substituted);
    }
    ensure_resolved(operation, "path template", &path)?;

    let mut url = format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    if !arguments.query.is_empty() {
        let mut query = String::new();
        for (name, value, encoding) in &arguments.query {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&utf8_percent_encode(name, QUERY_ENCODE_SET).to_string());
            query.push('=');
            match encoding {
                Encoding::Encode => {
                    query.push_str(&utf8_percent_encode(value, QUERY_ENCODE_SET).to_string())
                }
                Encoding::PreEncoded => query.push_str(value),
            }
        }
        url.push('?');
        url.push_str(&query);
    }

    let url = Url::parse(&url).map_err(|e| {
        RestError::configuration(operation, format!("resolved URL `{}` is invalid: {}", url, e))
    })?;

    let mut headers = HeaderMap::new();
    for (name, value) in descriptor.fixed_headers {
        append_header(operation, &mut headers, name, value)?;
    }
    for (name, value) in &arguments.headers {
        append_header(operation, &mut headers, name, value)?;
    }

    let body = match &arguments.body {
        None => None,
        Some(RequestBody::Octets(bytes)) => {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
            }
            Some(bytes.clone())
        }
        Some(RequestBody::Json(value)) => {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Some(Bytes::from(serde_json::to_vec(value)?))
        }
    };

    Ok(BuiltRequest {
        method: descriptor.method.clone(),
        url,
        headers,
        body,
    })
}

fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}

/// Fails when a template still contains a `{name}` placeholder after
/// substitution.
fn ensure_resolved(operation: &str, what: &str, resolved: &str) -> RestResult<()> {
    if let Some(start) = resolved.find('{') {
        let rest = &resolved[start + 1..];
        let name = rest.split('}').next().unwrap_or(rest);
        return Err(RestError::configuration(
            operation,
            format!("{} placeholder `{{{}}}` was not supplied", what, name),
        ));
    }
    Ok(())
}

fn append_header(
    operation: &str,
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
) -> RestResult<()> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        RestError::configuration(operation, format!("invalid header name `{}`: {}", name, e))
    })?;
    let value = HeaderValue::from_str(value).map_err(|e| {
        RestError::configuration(operation, format!("invalid value for header `{}`: {}", name, e))
    })?;
    headers.append(name, value);
    Ok(())
}

/// Splits a stored header value on unescaped commas.
///
/// A `\,` sequence escapes the comma into the value; surrounding whitespace
/// of each discrete value is trimmed.
pub fn split_header_values(value: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(',') => current.push(','),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ',' => {
                values.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    values.push(current.trim().to_string());
    values
}

/// Joins discrete values into a single stored header value, escaping commas
/// inside each value.
pub fn join_header_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().replace(',', "\\,"))
        .collect::<Vec<_>>()
        .join(",")
}
