//! Browser transport adapter over the native `fetch()` API

use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::{HttpError, HttpResult};
use crate::request::{PendingRequest, ResponseType};
use crate::response::Response;
use crate::transport::Transport;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "fetch")]
    fn js_fetch(input: &web_sys::Request) -> js_sys::Promise;
}

/// Browser transport over `fetch()`.
///
/// Cancellation is wired through an `AbortController`: dropping the
/// in-flight future (timeout or [`CallHandle::abort`](crate::CallHandle))
/// aborts the underlying fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport;

impl FetchTransport {
    /// Create a browser fetch transport
    pub fn new() -> Self {
        Self
    }
}

/// Aborts the fetch unless disarmed after completion
struct AbortGuard {
    controller: Option<web_sys::AbortController>,
}

impl AbortGuard {
    fn disarm(&mut self) {
        self.controller = None;
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if let Some(controller) = &self.controller {
            controller.abort();
        }
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn execute(&self, request: PendingRequest) -> HttpResult<Response> {
        let init = web_sys::RequestInit::new();
        init.set_method(request.method().as_str());

        let controller = web_sys::AbortController::new().ok();
        if let Some(controller) = &controller {
            init.set_signal(Some(&controller.signal()));
        }
        let mut guard = AbortGuard { controller };

        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }

        let js_request = web_sys::Request::new_with_str_and_init(&request.url(), &init)
            .map_err(|e| HttpError::Url(format!("failed to create request: {:?}", e)))?;

        let headers = js_request.headers();
        for (key, value) in &request.headers {
            headers
                .set(key, value)
                .map_err(|e| HttpError::Other(format!("failed to set header: {:?}", e)))?;
        }

        let response = JsFuture::from(js_fetch(&js_request))
            .await
            .map_err(|e| HttpError::Transport(format!("fetch failed: {:?}", e)))?;
        let response: web_sys::Response = response
            .dyn_into()
            .map_err(|_| HttpError::Other("response is not a web_sys::Response".to_string()))?;

        let status = response.status();
        let status_text = response.status_text();
        let header_entries = materialize_headers(&response.headers());

        let body = match request.response_type {
            ResponseType::Binary => {
                let promise = response
                    .array_buffer()
                    .map_err(|e| HttpError::Other(format!("failed to read body: {:?}", e)))?;
                let buffer = JsFuture::from(promise)
                    .await
                    .map_err(|e| HttpError::Other(format!("failed to read body: {:?}", e)))?;
                js_sys::Uint8Array::new(&buffer).to_vec()
            }
            ResponseType::Text => {
                let promise = response
                    .text()
                    .map_err(|e| HttpError::Other(format!("failed to read body: {:?}", e)))?;
                let text = JsFuture::from(promise)
                    .await
                    .map_err(|e| HttpError::Other(format!("failed to read body: {:?}", e)))?;
                text.as_string().unwrap_or_default().into_bytes()
            }
        };
        guard.disarm();

        Ok(Response::new(status, status_text, header_entries, body))
    }
}

fn materialize_headers(headers: &web_sys::Headers) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    if let Ok(Some(iter)) = js_sys::try_iter(headers) {
        for entry in iter.flatten() {
            let pair = js_sys::Array::from(&entry);
            let key = pair.get(0).as_string().unwrap_or_default();
            let value = pair.get(1).as_string().unwrap_or_default();
            entries.push((key, value));
        }
    }
    entries
}
