//! Transport capability seam
//!
//! A [`Transport`] is the concrete HTTP execution engine a platform binds
//! in. Adapters are interchangeable strategies behind [`DynTransport`]; the
//! dispatch layer in [`crate::RestCall`] adds timeout, abort, and one-shot
//! callback delivery on top of any of them.

use async_trait::async_trait;

use crate::error::HttpResult;
use crate::request::PendingRequest;
use crate::response::Response;

/// Shared handle to a transport strategy
#[cfg(not(target_arch = "wasm32"))]
pub type DynTransport = std::sync::Arc<dyn Transport + Send + Sync>;
/// Shared handle to a transport strategy
#[cfg(target_arch = "wasm32")]
pub type DynTransport = std::sync::Arc<dyn Transport>;

/// Executes a fully configured request against a concrete HTTP stack.
///
/// An implementation opens the connection for the request's method and URL,
/// applies every header in order, attaches the body if any, and resolves to
/// a normalized [`Response`] or an error. Cancellation is delivered by
/// dropping the returned future; adapters that need explicit teardown tie it
/// to `Drop`.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: std::fmt::Debug {
    /// Execute the request, resolving to its terminal outcome
    async fn execute(&self, request: PendingRequest) -> HttpResult<Response>;
}
