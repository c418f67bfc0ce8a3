//! REST client abstraction with pluggable HTTP transports
//!
//! This crate separates the description of a REST call from its execution.
//! A [`PendingRequest`] accumulates URI, method, ordered query parameters,
//! case-insensitive headers, body, and timeout; a [`Transport`] strategy
//! executes it against a concrete HTTP stack (reqwest on native targets,
//! the browser `fetch()` API on wasm); a [`Response`] normalizes whatever
//! the stack produced.
//!
//! # Typed client
//!
//! ```no_run
//! use restkit_http_client::{HttpClient, HttpResult};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct ApiResponse {
//!     message: String,
//! }
//!
//! async fn example() -> HttpResult<ApiResponse> {
//!     let client = HttpClient::new();
//!     client.fetch("https://api.example.com/data").await
//! }
//! ```
//!
//! # Callback dispatch
//!
//! A [`RestCall`] delivers exactly one terminal outcome to exactly one of
//! its two handlers, races the transport against an optional timeout, and
//! can be aborted without firing either handler:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use restkit_http_client::{default_transport, PendingRequest, RestCall};
//!
//! # fn example() -> restkit_http_client::HttpResult<()> {
//! let request = PendingRequest::get("https://api.example.com/items?page=1")
//!     .add_query_param("page", "2")
//!     .header("Authorization", "Bearer token123")
//!     .timeout(Duration::from_millis(500));
//!
//! let handle = RestCall::new(request, default_transport())
//!     .on_success(|response| println!("status {}", response.status()))
//!     .on_error(|error| eprintln!("request failed: {}", error))
//!     .send()?;
//!
//! // Later, if the caller loses interest:
//! handle.abort();
//! # Ok(())
//! # }
//! ```

mod backends;
mod call;
mod client;
mod error;
mod request;
mod response;
mod timer;
mod transport;

#[cfg(target_arch = "wasm32")]
pub use backends::FetchTransport;
#[cfg(not(target_arch = "wasm32"))]
pub use backends::ReqwestTransport;
pub use backends::default_transport;
pub use call::{CallHandle, RestCall};
pub use client::{fetch, HttpClient};
pub use error::{HttpError, HttpResult};
pub use request::{Method, PendingRequest, ResponseType};
pub use response::Response;
pub use transport::{DynTransport, Transport};
