//! One-shot dispatch of a pending request with callback delivery
//!
//! A [`RestCall`] pairs a [`PendingRequest`] with exactly one success and
//! one error handler, dispatches it on the platform's event loop, and
//! guarantees at-most-once, mutually exclusive delivery of the terminal
//! outcome. Whichever of transport completion, timeout, and
//! [`CallHandle::abort`] happens first wins; the others become no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortHandle, Abortable};
use serde::Serialize;

use crate::error::{HttpError, HttpResult};
use crate::request::PendingRequest;
use crate::response::Response;
use crate::timer;
use crate::transport::DynTransport;

#[cfg(not(target_arch = "wasm32"))]
type SuccessHandler = Box<dyn FnOnce(Response) + Send + 'static>;
#[cfg(target_arch = "wasm32")]
type SuccessHandler = Box<dyn FnOnce(Response) + 'static>;

#[cfg(not(target_arch = "wasm32"))]
type ErrorHandler = Box<dyn FnOnce(HttpError) + Send + 'static>;
#[cfg(target_arch = "wasm32")]
type ErrorHandler = Box<dyn FnOnce(HttpError) + 'static>;

/// A request bound to a transport and a pair of terminal-outcome handlers.
///
/// Send variants consume the call, so a request instance can never be
/// dispatched twice.
pub struct RestCall {
    request: PendingRequest,
    transport: DynTransport,
    on_success: Option<SuccessHandler>,
    on_error: Option<ErrorHandler>,
    misuse: Option<HttpError>,
}

impl std::fmt::Debug for RestCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCall")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl RestCall {
    /// Bind a request to a transport strategy
    pub fn new(request: PendingRequest, transport: DynTransport) -> Self {
        Self {
            request,
            transport,
            on_success: None,
            on_error: None,
            misuse: None,
        }
    }

    /// Register the success handler. Registering twice is a misuse error,
    /// surfaced when the call is sent.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn on_success(self, handler: impl FnOnce(Response) + Send + 'static) -> Self {
        self.register_success(Box::new(handler))
    }

    /// Register the success handler. Registering twice is a misuse error,
    /// surfaced when the call is sent.
    #[cfg(target_arch = "wasm32")]
    pub fn on_success(self, handler: impl FnOnce(Response) + 'static) -> Self {
        self.register_success(Box::new(handler))
    }

    /// Register the error handler. Registering twice is a misuse error,
    /// surfaced when the call is sent.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn on_error(self, handler: impl FnOnce(HttpError) + Send + 'static) -> Self {
        self.register_error(Box::new(handler))
    }

    /// Register the error handler. Registering twice is a misuse error,
    /// surfaced when the call is sent.
    #[cfg(target_arch = "wasm32")]
    pub fn on_error(self, handler: impl FnOnce(HttpError) + 'static) -> Self {
        self.register_error(Box::new(handler))
    }

    /// Dispatch the request without a body.
    ///
    /// Returns immediately; the terminal outcome is delivered to exactly one
    /// of the registered handlers on the platform's event loop.
    ///
    /// # Panics
    ///
    /// On native targets this must be called within a tokio runtime, as the
    /// call is driven by a spawned task.
    pub fn send(self) -> HttpResult<CallHandle> {
        self.dispatch()
    }

    /// Dispatch the request with a raw string body
    pub fn send_body(mut self, body: impl Into<String>) -> HttpResult<CallHandle> {
        self.request = self.request.body(body);
        self.dispatch()
    }

    /// Dispatch the request with a JSON body, forcing
    /// `Content-Type: application/json`
    pub fn send_json<T: Serialize + ?Sized>(mut self, body: &T) -> HttpResult<CallHandle> {
        self.request = self.request.json(body);
        self.dispatch()
    }

    /// Dispatch the request with a form body, forcing
    /// `Content-Type: application/x-www-form-urlencoded`. The body is
    /// literal `key=value` pairs joined by `&`, one pair per entry.
    pub fn send_form<K, V, I>(mut self, form: I) -> HttpResult<CallHandle>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.request = self.request.form(form);
        self.dispatch()
    }

    fn register_success(mut self, handler: SuccessHandler) -> Self {
        if self.on_success.is_some() {
            self.misuse = Some(HttpError::Misuse(
                "success handler already registered".to_string(),
            ));
        } else {
            self.on_success = Some(handler);
        }
        self
    }

    fn register_error(mut self, handler: ErrorHandler) -> Self {
        if self.on_error.is_some() {
            self.misuse = Some(HttpError::Misuse(
                "error handler already registered".to_string(),
            ));
        } else {
            self.on_error = Some(handler);
        }
        self
    }

    fn dispatch(mut self) -> HttpResult<CallHandle> {
        if let Some(error) = self.misuse.take() {
            return Err(error);
        }
        if let Some(error) = self.request.take_deferred_error() {
            return Err(error);
        }
        let on_success = self.on_success.take().ok_or_else(|| {
            HttpError::Misuse("a success handler must be registered before send".to_string())
        })?;
        let on_error = self.on_error.take().ok_or_else(|| {
            HttpError::Misuse("an error handler must be registered before send".to_string())
        })?;

        let settled = Arc::new(AtomicBool::new(false));
        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let handle = CallHandle {
            settled: Arc::clone(&settled),
            abort: abort_handle,
        };

        let transport = self.transport;
        let request = self.request;
        let timeout = request.timeout;
        tracing::debug!(method = %request.method(), url = %request.url(), "dispatching request");

        let deliver = async move {
            let outcome = if timeout > Duration::ZERO {
                match timer::timeout(timeout, transport.execute(request)).await {
                    Some(result) => result,
                    None => {
                        tracing::debug!(
                            timeout_ms = timeout.as_millis() as u64,
                            "request timed out"
                        );
                        Err(HttpError::Timeout)
                    }
                }
            } else {
                transport.execute(request).await
            };
            // First swap wins; abort() contends on the same flag.
            if !settled.swap(true, Ordering::SeqCst) {
                match outcome {
                    Ok(response) => on_success(response),
                    Err(error) => on_error(error),
                }
            }
        };
        spawn(async move {
            let _ = Abortable::new(deliver, abort_registration).await;
        });
        Ok(handle)
    }
}

/// Handle to an in-flight call.
///
/// Cloneable; any clone may abort the call or observe whether a terminal
/// outcome has been delivered.
#[derive(Debug, Clone)]
pub struct CallHandle {
    settled: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl CallHandle {
    /// Cancel the call. If no terminal outcome has been delivered yet, the
    /// underlying transport work is torn down and neither handler will ever
    /// run. After a terminal outcome this is a no-op.
    pub fn abort(&self) {
        if !self.settled.swap(true, Ordering::SeqCst) {
            tracing::debug!("request aborted before completion");
            self.abort.abort();
        }
    }

    /// Whether a terminal outcome has been delivered or the call aborted
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn(future: impl std::future::Future<Output = ()> + Send + 'static) {
    let _ = tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn(future: impl std::future::Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, UnboundedSender};

    use super::*;
    use crate::transport::Transport;

    /// A transport whose connection never completes
    #[derive(Debug)]
    struct NeverTransport;

    #[async_trait]
    impl Transport for NeverTransport {
        async fn execute(&self, _request: PendingRequest) -> HttpResult<Response> {
            futures::future::pending().await
        }
    }

    /// A transport that completes successfully after a fixed delay
    #[derive(Debug)]
    struct DelayedTransport {
        delay: Duration,
    }

    #[async_trait]
    impl Transport for DelayedTransport {
        async fn execute(&self, _request: PendingRequest) -> HttpResult<Response> {
            tokio::time::sleep(self.delay).await;
            Ok(Response::new(200, "OK".to_string(), vec![], b"done".to_vec()))
        }
    }

    fn call_with_probes(
        request: PendingRequest,
        transport: DynTransport,
        outcomes: UnboundedSender<&'static str>,
    ) -> RestCall {
        let on_success = {
            let outcomes = outcomes.clone();
            move |_response: Response| {
                let _ = outcomes.send("success");
            }
        };
        let on_error = move |error: HttpError| {
            let _ = outcomes.send(match error {
                HttpError::Timeout => "timeout",
                _ => "other",
            });
        };
        RestCall::new(request, transport)
            .on_success(on_success)
            .on_error(on_error)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_when_transport_never_completes() {
        let (outcomes, mut received) = mpsc::unbounded_channel();
        let request = PendingRequest::get("http://localhost/slow")
            .timeout(Duration::from_millis(50));
        let handle = call_with_probes(request, Arc::new(NeverTransport), outcomes)
            .send()
            .expect("dispatch should succeed");

        let first = received.recv().await.expect("a terminal outcome");
        assert_eq!(first, "timeout");
        assert!(handle.is_settled());

        // The success handler must never fire afterwards.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(received.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_before_timeout_fires_success_only() {
        let (outcomes, mut received) = mpsc::unbounded_channel();
        let request = PendingRequest::get("http://localhost/fast")
            .timeout(Duration::from_millis(50));
        let transport = Arc::new(DelayedTransport {
            delay: Duration::from_millis(10),
        });
        call_with_probes(request, transport, outcomes)
            .send()
            .expect("dispatch should succeed");

        let first = received.recv().await.expect("a terminal outcome");
        assert_eq!(first, "success");

        // The timer must be cancelled: no late timeout error.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(received.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_means_no_timer() {
        let (outcomes, mut received) = mpsc::unbounded_channel();
        let request = PendingRequest::get("http://localhost/slow");
        call_with_probes(request, Arc::new(NeverTransport), outcomes)
            .send()
            .expect("dispatch should succeed");

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(received.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_fires_neither_handler() {
        let (outcomes, mut received) = mpsc::unbounded_channel();
        let request = PendingRequest::get("http://localhost/slow")
            .timeout(Duration::from_millis(50));
        let handle = call_with_probes(request, Arc::new(NeverTransport), outcomes)
            .send()
            .expect("dispatch should succeed");

        handle.abort();
        assert!(handle.is_settled());

        // Neither the timeout nor any completion may be delivered.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(received.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_after_completion_is_noop() {
        let (outcomes, mut received) = mpsc::unbounded_channel();
        let request = PendingRequest::get("http://localhost/fast");
        let transport = Arc::new(DelayedTransport {
            delay: Duration::from_millis(10),
        });
        let handle = call_with_probes(request, transport, outcomes)
            .send()
            .expect("dispatch should succeed");

        let first = received.recv().await.expect("a terminal outcome");
        assert_eq!(first, "success");
        handle.abort();
        assert!(handle.is_settled());
        assert!(received.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_success_handler_is_misuse() {
        let request = PendingRequest::get("http://localhost/");
        let result = RestCall::new(request, Arc::new(NeverTransport))
            .on_success(|_| {})
            .on_success(|_| {})
            .on_error(|_| {})
            .send();
        assert!(matches!(result, Err(HttpError::Misuse(_))));
    }

    #[test]
    fn test_missing_error_handler_is_misuse() {
        let request = PendingRequest::get("http://localhost/");
        let result = RestCall::new(request, Arc::new(NeverTransport))
            .on_success(|_| {})
            .send();
        assert!(matches!(result, Err(HttpError::Misuse(_))));
    }

    #[test]
    fn test_deferred_json_error_surfaces_at_send() {
        let body = std::collections::BTreeMap::from([((1u8, 2u8), "x")]);
        let request = PendingRequest::post("http://localhost/");
        let result = RestCall::new(request, Arc::new(NeverTransport))
            .on_success(|_| {})
            .on_error(|_| {})
            .send_json(&body);
        assert!(matches!(result, Err(HttpError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_send_form_builds_literal_body() {
        // The body and forced content type are covered at the builder level;
        // here we only prove the send variant routes through it.
        let (outcomes, _received) = mpsc::unbounded_channel();
        let request = PendingRequest::post("http://localhost/form");
        let handle = call_with_probes(request, Arc::new(NeverTransport), outcomes)
            .send_form([("x", "1"), ("y", "2")])
            .expect("dispatch should succeed");
        handle.abort();
    }
}
