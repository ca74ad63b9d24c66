//! # REST Invocation Core
//!
//! Descriptor-driven REST invocation: turn a statically declared operation
//! plus call-time arguments into an HTTP request, dispatch it through a
//! transport, and map the response back into a typed value.
//!
//! ## Features
//!
//! - Endpoint descriptors with host/path templates, expected status sets
//!   and declared return shapes, validated eagerly before any network call
//! - One build → transport → map pipeline shared by the async and blocking
//!   invocation forms, guaranteeing identical semantics
//! - Percent-encoding with per-parameter pre-encoded pass-through
//! - Typed or structural service error payloads
//! - Lazy paged collections with list-iterator mutation semantics
//! - Mock transports for London-School TDD
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_restcore::{
//!     CallArguments, EndpointDescriptor, Invoker, ReqwestTransport, ReturnShape,
//! };
//! use http::Method;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let descriptor = EndpointDescriptor::new(
//!         "widgets.get",
//!         Method::GET,
//!         "https://{account}.example.net",
//!         "/widgets/{id}",
//!     )
//!     .with_returns(ReturnShape::Json);
//!
//!     let invoker = Invoker::new(Arc::new(ReqwestTransport::new()?));
//!     let arguments = CallArguments::new()
//!         .host_part("account", "contoso")
//!         .path_param("id", 7);
//!
//!     let widget: serde_json::Value = invoker.invoke_json(&descriptor, &arguments).await?;
//!     println!("{widget}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `descriptor` - Endpoint metadata and the operation registry
//! - `request` - Call arguments and request building
//! - `response` - Status validation and return-shape decoding
//! - `dispatch` - Async and blocking invocation over one shared pipeline
//! - `transport` - Transport traits and reqwest-backed implementations
//! - `paging` - Pages and lazy paged collections
//! - `auth` - Auth-header providers
//! - `errors` - Error taxonomy
//! - `mocks` - Mock transports for testing
//! - `fixtures` - Test fixtures and helper data

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod auth;
pub mod descriptor;
pub mod dispatch;
pub mod errors;
pub mod paging;
pub mod request;
pub mod response;
pub mod transport;

// Development/testing modules
#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mocks;

// Re-exports for convenience
pub use auth::{AuthProvider, StaticHeaderAuth};
pub use descriptor::{EndpointDescriptor, ErrorShape, OperationRegistry, ReturnShape, WrappedBody};
pub use dispatch::{BlockingInvoker, Invoker};
pub use errors::{CloudError, ErrorCode, RestError, RestResult};
pub use paging::{Cursor, Page, PageFetcher, PagedList};
pub use request::{BuiltRequest, CallArguments, Encoding, RequestBody};
pub use response::ResponseEnvelope;
pub use transport::{
    BlockingHttpTransport, BlockingReqwestTransport, HttpTransport, RawResponse, ReqwestTransport,
    TransportOptions,
};
