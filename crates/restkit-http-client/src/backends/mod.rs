//! Platform transport adapters

#[cfg(not(target_arch = "wasm32"))]
pub mod reqwest_backend;

#[cfg(target_arch = "wasm32")]
pub mod wasm_backend;

#[cfg(not(target_arch = "wasm32"))]
pub use reqwest_backend::ReqwestTransport;
#[cfg(target_arch = "wasm32")]
pub use wasm_backend::FetchTransport;

use crate::transport::DynTransport;

/// The default transport strategy for the current platform: `reqwest` on
/// native targets, the browser `fetch()` API on wasm.
pub fn default_transport() -> DynTransport {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::sync::Arc::new(ReqwestTransport::new())
    }
    #[cfg(target_arch = "wasm32")]
    {
        std::sync::Arc::new(FetchTransport::new())
    }
}
