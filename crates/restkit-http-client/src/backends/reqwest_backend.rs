//! reqwest-based transport adapter

use async_trait::async_trait;

use crate::error::{HttpError, HttpResult};
use crate::request::{Method, PendingRequest};
use crate::response::Response;
use crate::transport::Transport;

/// Server-side transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Create a transport with default client settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport from a preconfigured `reqwest::Client`
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: PendingRequest) -> HttpResult<Response> {
        let url = url::Url::parse(&request.url()).map_err(HttpError::from)?;
        tracing::trace!(method = %request.method(), %url, "executing request");

        let mut builder = self.client.request(map_method(request.method()), url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(HttpError::from)?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let mut headers = Vec::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.push((name.as_str().to_string(), value.to_string()));
            }
        }
        let body = response.bytes().await.map_err(HttpError::from)?.to_vec();

        Ok(Response::new(status.as_u16(), status_text, headers, body))
    }
}
