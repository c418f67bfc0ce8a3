//! Typed convenience client over the transport seam

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::call::RestCall;
use crate::error::{HttpError, HttpResult};
use crate::request::{PendingRequest, CONTENT_TYPE, FORM_URLENCODED};
use crate::response::Response;
use crate::timer;
use crate::transport::DynTransport;

/// HTTP client wrapper.
///
/// Holds a shared [`Transport`](crate::Transport) strategy and offers typed
/// JSON convenience methods on top of it. Cloning shares the transport.
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: DynTransport,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a client over the default transport for this platform
    pub fn new() -> Self {
        Self {
            transport: crate::backends::default_transport(),
        }
    }

    /// Create a client over a specific transport strategy
    pub fn with_transport(transport: DynTransport) -> Self {
        Self { transport }
    }

    // === Simple convenience methods ===

    /// GET request, returns JSON deserialized to R
    pub async fn fetch<R>(&self, url: &str) -> HttpResult<R>
    where
        R: DeserializeOwned,
    {
        let response = self.execute(PendingRequest::get(url)).await?;
        into_json(response)
    }

    /// POST with JSON body, returns JSON deserialized to R
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> HttpResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.execute(PendingRequest::post(url).json(body)).await?;
        into_json(response)
    }

    /// POST with form data, returns JSON deserialized to R.
    ///
    /// Unlike [`PendingRequest::form`], the body is percent-encoded from any
    /// `Serialize` value.
    pub async fn post_form<F, R>(&self, url: &str, form: &F) -> HttpResult<R>
    where
        F: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_urlencoded::to_string(form)
            .map_err(|e| HttpError::Serialization(e.to_string()))?;
        let request = PendingRequest::post(url)
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .body(body);
        let response = self.execute(request).await?;
        into_json(response)
    }

    /// PATCH with JSON body, returns JSON deserialized to R
    pub async fn patch_json<B, R>(&self, url: &str, body: &B) -> HttpResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.execute(PendingRequest::patch(url).json(body)).await?;
        into_json(response)
    }

    /// GET request returning the raw response, regardless of status
    pub async fn get_raw(&self, url: &str) -> HttpResult<Response> {
        self.execute(PendingRequest::get(url)).await
    }

    // === Request execution ===

    /// Execute a configured request, honoring its timeout.
    ///
    /// The response is returned whatever its status; only transport-level
    /// failures and timeouts are errors.
    pub async fn execute(&self, mut request: PendingRequest) -> HttpResult<Response> {
        if let Some(error) = request.take_deferred_error() {
            return Err(error);
        }
        let timeout = request.timeout;
        if timeout > Duration::ZERO {
            match timer::timeout(timeout, self.transport.execute(request)).await {
                Some(result) => result,
                None => Err(HttpError::Timeout),
            }
        } else {
            self.transport.execute(request).await
        }
    }

    /// Wrap a configured request for callback-style dispatch on this
    /// client's transport
    pub fn call(&self, request: PendingRequest) -> RestCall {
        RestCall::new(request, Arc::clone(&self.transport))
    }
}

fn into_json<R: DeserializeOwned>(response: Response) -> HttpResult<R> {
    if !response.is_success() {
        return Err(HttpError::Status {
            status: response.status(),
            message: response.text().into_owned(),
        });
    }
    response.json()
}

/// Convenience function for simple GET requests
pub async fn fetch<R: DeserializeOwned>(url: &str) -> HttpResult<R> {
    HttpClient::new().fetch(url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = HttpClient::new();
        let _ = format!("{:?}", client);
    }

    #[test]
    fn test_client_default() {
        let client = HttpClient::default();
        let _ = format!("{:?}", client);
    }

    #[test]
    fn test_into_json_maps_error_status() {
        let response = Response::new(404, "Not Found".to_string(), vec![], b"missing".to_vec());
        let result: HttpResult<serde_json::Value> = into_json(response);
        match result {
            Err(HttpError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "missing");
            }
            _ => panic!("Expected HttpError::Status"),
        }
    }

    #[test]
    fn test_into_json_parses_success_body() {
        let response = Response::new(200, "OK".to_string(), vec![], br#"{"ok":true}"#.to_vec());
        let parsed: serde_json::Value = into_json(response).expect("JSON should parse");
        assert_eq!(parsed["ok"], true);
    }
}
