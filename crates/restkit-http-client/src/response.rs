//! Uniform HTTP response wrapper

use std::borrow::Cow;

use serde::de::DeserializeOwned;

use crate::error::{HttpError, HttpResult};

/// A completed HTTP response, normalized from whatever the transport
/// produced: status line, materialized headers, and the full body.
///
/// Responses are created only by a [`Transport`](crate::Transport) and are
/// read-only to consumers.
#[derive(Debug)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn new(
        status: u16,
        status_text: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            status_text,
            headers,
            body,
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the textual status reason (`"OK"`, `"Not Found"`, ...)
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Look up a header value by name, ASCII case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All response headers as name/value pairs
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get the response body as text.
    ///
    /// Lossy for payloads that are not valid UTF-8; use
    /// [`bytes`](Self::bytes) for binary payloads.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Get the response body as bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response, returning the body bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    /// Deserialize the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        serde_json::from_slice(&self.body).map_err(HttpError::from)
    }
}
