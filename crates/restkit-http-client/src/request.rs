//! Transport-agnostic request description and builder

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::HttpError;

pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const APPLICATION_JSON: &str = "application/json";
pub(crate) const APPLICATION_PDF: &str = "application/pdf";
pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Method {
    /// The method token as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(HttpError::Misuse(format!("unsupported HTTP method: {}", s))),
        }
    }
}

/// Desired representation of the response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Decode the body as text
    #[default]
    Text,
    /// Capture the body as a raw byte buffer
    Binary,
}

/// A fully specified, not-yet-dispatched HTTP call description.
///
/// Builder methods consume and return `self` so configuration chains.
/// Dispatching takes the request by value, so an in-flight call can never
/// observe later mutations.
#[derive(Debug)]
pub struct PendingRequest {
    uri: String,
    method: Method,
    params: Vec<(String, Vec<String>)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<String>,
    pub(crate) timeout: Duration,
    pub(crate) response_type: ResponseType,
    error: Option<HttpError>,
}

impl PendingRequest {
    /// Create a request for the given URI and method.
    ///
    /// Everything after the first `?` in the URI is re-parsed into query
    /// parameters, so parameters embedded in the URI compose with later
    /// [`add_query_param`](Self::add_query_param) calls.
    pub fn new(uri: impl Into<String>, method: Method) -> Self {
        let uri = uri.into();
        let (uri, query) = match uri.split_once('?') {
            Some((uri, query)) => (uri.to_string(), Some(query.to_string())),
            None => (uri, None),
        };
        let mut request = Self {
            uri,
            method,
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::ZERO,
            response_type: ResponseType::Text,
            error: None,
        };
        if let Some(query) = query {
            request.push_query_string(&query);
        }
        request
    }

    /// GET request for the given URI
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Get)
    }

    /// POST request for the given URI
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Post)
    }

    /// PUT request for the given URI
    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Put)
    }

    /// DELETE request for the given URI
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Delete)
    }

    /// PATCH request for the given URI
    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Patch)
    }

    /// HEAD request for the given URI
    pub fn head(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Head)
    }

    /// OPTIONS request for the given URI
    pub fn options(uri: impl Into<String>) -> Self {
        Self::new(uri, Method::Options)
    }

    /// Append a value to the ordered value list for `key`.
    ///
    /// Duplicate keys are valid and produce repeated `key=value` pairs
    /// (`a=1&a=2`).
    pub fn add_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_query_param(key.into(), value.into());
        self
    }

    /// Replace any existing values for `key` with the single given value
    pub fn set_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => {
                values.clear();
                values.push(value);
            }
            None => self.params.push((key, vec![value])),
        }
        self
    }

    /// Append all entries as query parameters
    pub fn query_params<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in params {
            self.push_query_param(key.into(), value.into());
        }
        self
    }

    /// Set a header. Names are matched ASCII case-insensitively and the last
    /// write wins; first-write insertion order is preserved.
    ///
    /// Writing `Content-Type` also selects the response representation: a
    /// binary media type (`application/pdf`) switches to
    /// [`ResponseType::Binary`], anything else back to
    /// [`ResponseType::Text`]. The last write before send wins; an explicit
    /// [`response_type`](Self::response_type) call afterwards overrides.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_header(key.into(), value.into());
        self
    }

    /// Set all entries as headers
    pub fn headers<K, V, I>(mut self, headers: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in headers {
            self.insert_header(key.into(), value.into());
        }
        self
    }

    /// Set a raw string body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body, forcing `Content-Type: application/json`.
    ///
    /// A serialization failure is held in the builder and surfaced when the
    /// request is dispatched.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(json) => {
                self.body = Some(json);
                self.insert_header(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
            }
            Err(e) => self.error = Some(HttpError::from(e)),
        }
        self
    }

    /// Set a form body, forcing `Content-Type: application/x-www-form-urlencoded`.
    ///
    /// The body is built as literal `key=value` pairs joined by `&`, one pair
    /// per entry. Values are not percent-encoded; encoding is the caller's
    /// responsibility.
    pub fn form<K, V, I>(mut self, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let body = fields
            .into_iter()
            .map(|(key, value)| format!("{}={}", key.into(), value.into()))
            .collect::<Vec<_>>()
            .join("&");
        self.body = Some(body);
        self.insert_header(CONTENT_TYPE.to_string(), FORM_URLENCODED.to_string());
        self
    }

    /// Set the timeout for the dispatched call. [`Duration::ZERO`] (the
    /// default) means no timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Explicitly select the response representation
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// The request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// The URI without its query string
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The full URL: URI plus serialized query parameters, if any
    pub fn url(&self) -> String {
        let query = self.params_as_string();
        if query.is_empty() {
            self.uri.clone()
        } else {
            format!("{}?{}", self.uri, query)
        }
    }

    /// Serialize the query parameters: `key=value` pairs joined by `&`, with
    /// multi-valued keys expanded into repeated pairs. Output order is
    /// first-seen key order, then per-key insertion order.
    pub fn params_as_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, values)| {
                values
                    .iter()
                    .map(|value| format!("{}={}", key, value))
                    .collect::<Vec<_>>()
                    .join("&")
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub(crate) fn take_deferred_error(&mut self) -> Option<HttpError> {
        self.error.take()
    }

    fn push_query_param(&mut self, key: String, value: String) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.params.push((key, vec![value])),
        }
    }

    fn push_query_string(&mut self, query: &str) {
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.push_query_param(key.to_string(), value.to_string());
        }
    }

    fn insert_header(&mut self, key: String, value: String) {
        if key.eq_ignore_ascii_case(CONTENT_TYPE) {
            self.response_type = if value.eq_ignore_ascii_case(APPLICATION_PDF) {
                ResponseType::Binary
            } else {
                ResponseType::Text
            };
        }
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some((_, v)) => *v = value,
            None => self.headers.push((key, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_round_trip() {
        let request = PendingRequest::get("path?a=1&a=2&b=3");
        assert_eq!(request.uri(), "path");
        assert_eq!(request.params_as_string(), "a=1&a=2&b=3");
        assert_eq!(request.url(), "path?a=1&a=2&b=3");
    }

    #[test]
    fn test_add_query_param_preserves_order() {
        let request = PendingRequest::get("path")
            .add_query_param("b", "1")
            .add_query_param("a", "2")
            .add_query_param("b", "3");
        assert_eq!(request.params_as_string(), "b=1&b=3&a=2");
    }

    #[test]
    fn test_embedded_params_compose_with_added_params() {
        let request = PendingRequest::get("path?a=1").add_query_param("a", "2");
        assert_eq!(request.params_as_string(), "a=1&a=2");
    }

    #[test]
    fn test_set_query_param_replaces_values() {
        let request = PendingRequest::get("path")
            .add_query_param("a", "1")
            .add_query_param("a", "2")
            .set_query_param("a", "x");
        assert_eq!(request.params_as_string(), "a=x");
    }

    #[test]
    fn test_uri_split_at_first_question_mark_only() {
        let request = PendingRequest::get("path?a=1?b=2");
        assert_eq!(request.uri(), "path");
        assert_eq!(request.params_as_string(), "a=1?b=2");
    }

    #[test]
    fn test_query_pair_without_value() {
        let request = PendingRequest::get("path?flag&a=1");
        assert_eq!(request.params_as_string(), "flag=&a=1");
    }

    #[test]
    fn test_url_without_params() {
        let request = PendingRequest::get("https://example.com/items");
        assert_eq!(request.url(), "https://example.com/items");
    }

    #[test]
    fn test_header_overwrite_is_case_insensitive() {
        let request = PendingRequest::get("path")
            .header("X-Token", "one")
            .header("x-token", "two");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers[0], ("X-Token".to_string(), "two".to_string()));
    }

    #[test]
    fn test_pdf_content_type_selects_binary_response() {
        let request = PendingRequest::get("path").header("content-type", "Application/PDF");
        assert_eq!(request.response_type, ResponseType::Binary);
    }

    #[test]
    fn test_last_content_type_write_wins_for_response_type() {
        let request = PendingRequest::get("path")
            .header(CONTENT_TYPE, APPLICATION_PDF)
            .header(CONTENT_TYPE, APPLICATION_JSON);
        assert_eq!(request.response_type, ResponseType::Text);
    }

    #[test]
    fn test_explicit_response_type_overrides_content_type() {
        let request = PendingRequest::get("path")
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .response_type(ResponseType::Binary);
        assert_eq!(request.response_type, ResponseType::Binary);
    }

    #[test]
    fn test_bulk_headers_and_params() {
        let request = PendingRequest::get("path")
            .headers([("A", "1"), ("B", "2")])
            .query_params([("x", "1"), ("y", "2")]);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.params_as_string(), "x=1&y=2");
    }

    #[test]
    fn test_empty_bulk_arguments_are_noops() {
        let request = PendingRequest::get("path")
            .headers(Vec::<(String, String)>::new())
            .query_params(Vec::<(String, String)>::new());
        assert!(request.headers.is_empty());
        assert_eq!(request.params_as_string(), "");
    }

    #[test]
    fn test_form_body_is_literal_pairs() {
        let request = PendingRequest::post("path").form([("x", "1"), ("y", "2")]);
        assert_eq!(request.body.as_deref(), Some("x=1&y=2"));
        assert_eq!(
            request.headers[0],
            (CONTENT_TYPE.to_string(), FORM_URLENCODED.to_string())
        );
    }

    #[test]
    fn test_json_body_forces_content_type() {
        let request = PendingRequest::post("path").json(&serde_json::json!({"a": 1}));
        assert_eq!(request.body.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(
            request.headers[0],
            (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())
        );
    }

    #[test]
    fn test_json_serialization_failure_is_deferred() {
        // Maps with non-string keys are not representable in JSON.
        let body = std::collections::BTreeMap::from([((1u8, 2u8), "x")]);
        let mut request = PendingRequest::post("path").json(&body);
        let error = request.take_deferred_error();
        assert!(matches!(error, Some(HttpError::Serialization(_))));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().expect("valid method"), Method::Get);
        assert_eq!(
            "OPTIONS".parse::<Method>().expect("valid method"),
            Method::Options
        );
        let error = "FETCH".parse::<Method>().expect_err("unsupported method");
        assert!(matches!(error, HttpError::Misuse(_)));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_shorthand_constructors() {
        assert_eq!(PendingRequest::get("p").method(), Method::Get);
        assert_eq!(PendingRequest::post("p").method(), Method::Post);
        assert_eq!(PendingRequest::put("p").method(), Method::Put);
        assert_eq!(PendingRequest::delete("p").method(), Method::Delete);
        assert_eq!(PendingRequest::patch("p").method(), Method::Patch);
        assert_eq!(PendingRequest::head("p").method(), Method::Head);
        assert_eq!(PendingRequest::options("p").method(), Method::Options);
    }
}
