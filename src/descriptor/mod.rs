//! Static per-operation metadata.
//!
//! An [`EndpointDescriptor`] captures everything that is known about an
//! operation before any call is made: verb, host and path templates, fixed
//! headers, the expected status set, the declared error shape and the
//! declared return shape. Descriptors are immutable and are meant to be
//! declared once (typically as `static` items) and shared freely across
//! concurrent invocations.

use crate::errors::{RestError, RestResult};
use http::Method;
use std::collections::HashMap;
use std::fmt;

/// How error response bodies decode for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorShape {
    /// Keep the raw structural payload (a generic JSON value) so callers
    /// can still extract fields such as `data`.
    #[default]
    Structured,
    /// Additionally decode the `{"error": {code, message, ...}}` envelope
    /// into a typed [`CloudError`](crate::errors::CloudError).
    Cloud,
}

/// The declared shape of an operation's successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// No content; the body is drained and discarded.
    Unit,
    /// The undecoded body bytes.
    Bytes,
    /// The body decoded into a caller-chosen structural type.
    Json,
    /// Status, headers and an optional decoded body.
    Wrapped(WrappedBody),
    /// An unbounded response stream. Declaring this on a unary operation
    /// is a configuration error; the dispatcher rejects it eagerly.
    Stream,
}

/// Body shape inside a wrapped-response declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrappedBody {
    /// The body is drained and reported as absent.
    Unit,
    /// The body decodes into a caller-chosen structural type.
    Json,
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnShape::Unit => write!(f, "unit"),
            ReturnShape::Bytes => write!(f, "bytes"),
            ReturnShape::Json => write!(f, "json"),
            ReturnShape::Wrapped(WrappedBody::Unit) => write!(f, "wrapped unit"),
            ReturnShape::Wrapped(WrappedBody::Json) => write!(f, "wrapped json"),
            ReturnShape::Stream => write!(f, "stream"),
        }
    }
}

/// Static metadata for one declared operation.
///
/// Host and path templates may contain `{name}` placeholders which are
/// substituted from call arguments at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Stable operation identifier, e.g. `"widgets.get"`. Used in error
    /// messages and tracing output.
    pub operation: &'static str,
    /// HTTP verb.
    pub method: Method,
    /// Scheme and authority template, e.g. `"https://{account}.example.net"`.
    pub host: &'static str,
    /// Path template, e.g. `"/widgets/{id}"`.
    pub path: &'static str,
    /// Headers applied to every request before per-call header arguments.
    pub fixed_headers: &'static [(&'static str, &'static str)],
    /// Expected success statuses. `None` means "anything below 400".
    pub expected_statuses: Option<&'static [u16]>,
    /// How error bodies decode.
    pub error_shape: ErrorShape,
    /// Declared shape of the successful result.
    pub returns: ReturnShape,
}

impl EndpointDescriptor {
    /// Creates a descriptor with no fixed headers, no expected status set,
    /// structured errors and a unit return shape.
    pub fn new(
        operation: &'static str,
        method: Method,
        host: &'static str,
        path: &'static str,
    ) -> Self {
        Self {
            operation,
            method,
            host,
            path,
            fixed_headers: &[],
            expected_statuses: None,
            error_shape: ErrorShape::Structured,
            returns: ReturnShape::Unit,
        }
    }

    /// Sets the expected status set.
    pub fn with_expected_statuses(mut self, statuses: &'static [u16]) -> Self {
        self.expected_statuses = Some(statuses);
        self
    }

    /// Sets the fixed headers.
    pub fn with_fixed_headers(mut self, headers: &'static [(&'static str, &'static str)]) -> Self {
        self.fixed_headers = headers;
        self
    }

    /// Sets the error shape.
    pub fn with_error_shape(mut self, shape: ErrorShape) -> Self {
        self.error_shape = shape;
        self
    }

    /// Sets the return shape.
    pub fn with_returns(mut self, returns: ReturnShape) -> Self {
        self.returns = returns;
        self
    }

    /// Returns true when `status` counts as success for this operation.
    ///
    /// An explicit set is strict: declaring `[200]` makes a 300 response an
    /// error even though it is below 400. Without a declared set, anything
    /// below 400 passes.
    pub fn expects(&self, status: u16) -> bool {
        match self.expected_statuses {
            Some(set) => set.contains(&status),
            None => status < 400,
        }
    }

    /// Validates the declaration itself, before any network traffic.
    ///
    /// Rejects return shapes the unary dispatch path cannot produce: an
    /// unbounded stream, and body-bearing shapes on `HEAD` operations
    /// (whose responses never carry a meaningful body).
    pub fn validate(&self) -> RestResult<()> {
        match self.returns {
            ReturnShape::Stream => {
                return Err(RestError::configuration(
                    self.operation,
                    format!("unsupported declared return shape `{}`", self.returns),
                ));
            }
            ReturnShape::Bytes | ReturnShape::Json if self.method == Method::HEAD => {
                return Err(RestError::configuration(
                    self.operation,
                    format!(
                        "HEAD responses carry no body; declared return shape `{}` cannot be produced",
                        self.returns
                    ),
                ));
            }
            _ => {}
        }

        check_template(self.operation, "host template", self.host)?;
        check_template(self.operation, "path template", self.path)?;
        Ok(())
    }
}

/// Rejects templates with unbalanced or empty `{}` placeholders.
fn check_template(operation: &str, what: &str, template: &str) -> RestResult<()> {
    let mut depth = 0usize;
    let mut name_len = 0usize;
    for c in template.chars() {
        match c {
            '{' => {
                if depth > 0 {
                    return Err(RestError::configuration(
                        operation,
                        format!("{} `{}` has a nested `{{`", what, template),
                    ));
                }
                depth = 1;
                name_len = 0;
            }
            '}' => {
                if depth == 0 {
                    return Err(RestError::configuration(
                        operation,
                        format!("{} `{}` has an unmatched `}}`", what, template),
                    ));
                }
                if name_len == 0 {
                    return Err(RestError::configuration(
                        operation,
                        format!("{} `{}` has an empty placeholder", what, template),
                    ));
                }
                depth = 0;
            }
            _ if depth > 0 => name_len += 1,
            _ => {}
        }
    }
    if depth > 0 {
        return Err(RestError::configuration(
            operation,
            format!("{} `{}` has an unterminated placeholder", what, template),
        ));
    }
    Ok(())
}

/// Registry mapping operation identifiers to their descriptors.
///
/// Replaces proxy-style interface satisfaction: callers register each
/// operation once at startup and look descriptors up by identifier.
#[derive(Default)]
pub struct OperationRegistry {
    entries: HashMap<&'static str, &'static EndpointDescriptor>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a descriptor.
    ///
    /// Registering two descriptors under the same operation identifier is a
    /// configuration error.
    pub fn register(&mut self, descriptor: &'static EndpointDescriptor) -> RestResult<()> {
        descriptor.validate()?;
        if self.entries.contains_key(descriptor.operation) {
            return Err(RestError::configuration(
                descriptor.operation,
                "operation registered twice",
            ));
        }
        self.entries.insert(descriptor.operation, descriptor);
        Ok(())
    }

    /// Looks up a descriptor by operation identifier.
    pub fn get(&self, operation: &str) -> Option<&'static EndpointDescriptor> {
        self.entries.get(operation).copied()
    }

    /// Returns the number of registered operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no operations are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
