//! Error types for the REST invocation core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for invocation operations.
pub type RestResult<T> = Result<T, RestError>;

/// Main error type for the invocation core.
///
/// Variants are cheap to clone so that scripted transports and matched
/// sync/async test pairs can compare full error values with `PartialEq`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestError {
    /// Configuration error (unresolved template placeholder, unsupported
    /// declared return shape, invalid descriptor). Raised before any
    /// network call and never retryable.
    #[error("configuration error in `{operation}`: {message}")]
    Configuration {
        /// Identifier of the operation whose declaration is invalid
        operation: String,
        /// Description of the configuration problem
        message: String,
    },

    /// The service answered with a status outside the operation's
    /// expected set (or >= 400 when no set is declared).
    #[error("service error in `{operation}`: HTTP {status}")]
    Service {
        /// Identifier of the failing operation
        operation: String,
        /// HTTP status code of the response
        status: u16,
        /// Raw structural error payload decoded from the response body
        payload: serde_json::Value,
        /// Typed error detail, present when the operation declares the
        /// cloud error shape and the body decodes into it
        cloud: Option<CloudError>,
    },

    /// Network-level failure surfaced from the transport (connection,
    /// timeout, cancellation). Never generated by this crate itself.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// Request body serialization or response body decoding failed.
    #[error("data conversion error: {message}")]
    DataConversion {
        /// Description of the conversion failure
        message: String,
    },

    /// Invalid cursor mutation sequencing on a paged collection.
    #[error("iteration state error: {message}")]
    IterationState {
        /// Description of the sequencing violation
        message: String,
    },

    /// Index past the end of a fully fetched paged collection.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// The requested logical index
        index: usize,
        /// The materialized length at the time of the access
        len: usize,
    },
}

impl RestError {
    /// Returns the HTTP status code for service errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for errors raised before any network traffic.
    pub fn is_configuration(&self) -> bool {
        matches!(self, RestError::Configuration { .. })
    }

    /// Creates a configuration error scoped to an operation.
    pub fn configuration(operation: impl Into<String>, message: impl Into<String>) -> Self {
        RestError::Configuration {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        RestError::Transport {
            message: message.into(),
        }
    }

    /// Creates a data conversion error.
    pub fn data_conversion(message: impl Into<String>) -> Self {
        RestError::DataConversion {
            message: message.into(),
        }
    }

    /// Creates an iteration state error.
    pub fn iteration_state(message: impl Into<String>) -> Self {
        RestError::IterationState {
            message: message.into(),
        }
    }
}

/// Service-defined error code: an open set of string values with a
/// registry of well-known constants.
///
/// Services add codes over time, so unrecognized values pass through
/// untouched. Equality and hashing follow the underlying string, never
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(String);

impl ErrorCode {
    /// The target resource does not exist.
    pub const RESOURCE_NOT_FOUND: &'static str = "ResourceNotFound";
    /// The request conflicts with the current resource state.
    pub const CONFLICT: &'static str = "Conflict";
    /// The caller is being throttled.
    pub const TOO_MANY_REQUESTS: &'static str = "TooManyRequests";
    /// The request was rejected by authorization rules.
    pub const AUTHORIZATION_FAILED: &'static str = "AuthorizationFailed";

    const KNOWN: &'static [&'static str] = &[
        Self::RESOURCE_NOT_FOUND,
        Self::CONFLICT,
        Self::TOO_MANY_REQUESTS,
        Self::AUTHORIZATION_FAILED,
    ];

    /// Wraps a code value, well-known or not.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The underlying string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the value is in the well-known registry.
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(&self.0.as_str())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<ErrorCode> for &str {
    fn eq(&self, other: &ErrorCode) -> bool {
        *self == other.0
    }
}

/// Typed error detail in the common cloud error envelope,
/// `{"error": {"code": ..., "message": ..., "target": ..., "details": [...]}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloudError {
    /// Service-defined error code
    pub code: Option<ErrorCode>,
    /// Human-readable error message
    pub message: Option<String>,
    /// The request element the error refers to
    pub target: Option<String>,
    /// Nested error details
    #[serde(default)]
    pub details: Vec<CloudError>,
}

// Conversions from common error types
impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Transport {
                message: format!("request timed out: {}", err),
            }
        } else if err.is_connect() {
            RestError::Transport {
                message: format!("connection failed: {}", err),
            }
        } else {
            RestError::Transport {
                message: format!("request failed: {}", err),
            }
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::DataConversion {
            message: err.to_string(),
        }
    }
}
