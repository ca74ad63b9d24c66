//! Credential/auth-header provider consumed by the dispatcher.
//!
//! Token acquisition and refresh are external collaborators' concerns; the
//! core only applies whatever headers the provider yields to each built
//! request.

use crate::errors::{RestError, RestResult};
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

/// Supplies authentication headers for outgoing requests.
pub trait AuthProvider: Send + Sync {
    /// Applies the provider's headers to a request's header map.
    fn apply(&self, headers: &mut HeaderMap) -> RestResult<()>;
}

/// Auth provider that sets one fixed header from secret material.
pub struct StaticHeaderAuth {
    name: HeaderName,
    value: SecretString,
}

impl StaticHeaderAuth {
    /// Creates a provider for an arbitrary header name.
    pub fn new(name: &str, value: SecretString) -> RestResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            RestError::transport(format!("invalid auth header name `{}`: {}", name, e))
        })?;
        Ok(Self { name, value })
    }

    /// Creates a provider that sets `Authorization: Bearer <token>`.
    pub fn bearer(token: SecretString) -> Self {
        Self {
            name: AUTHORIZATION,
            value: SecretString::new(format!("Bearer {}", token.expose_secret())),
        }
    }
}

impl AuthProvider for StaticHeaderAuth {
    fn apply(&self, headers: &mut HeaderMap) -> RestResult<()> {
        let value = HeaderValue::from_str(self.value.expose_secret())
            .map_err(|e| RestError::transport(format!("invalid auth header value: {}", e)))?;
        headers.insert(self.name.clone(), value);
        Ok(())
    }
}
