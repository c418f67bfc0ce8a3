//! Cross-platform timeout primitive
//!
//! Native builds race via tokio's timer wheel; wasm builds arm a browser
//! `setTimeout` whose `Drop` clears the timer. Clearing an already-fired
//! timer is a no-op, so cancellation is idempotent on both platforms.

use std::future::Future;
use std::time::Duration;

/// Run `future` to completion unless `duration` elapses first.
///
/// Returns `None` when the timer wins; the future is dropped, which cancels
/// any in-flight transport work.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn timeout<F: Future>(duration: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(duration, future).await.ok()
}

/// Run `future` to completion unless `duration` elapses first.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn timeout<F: Future>(duration: Duration, future: F) -> Option<F::Output> {
    use futures::future::{select, Either};

    let sleep = wasm::sleep(duration);
    futures::pin_mut!(future);
    futures::pin_mut!(sleep);
    match select(future, sleep).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(((), _)) => None,
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    /// A `setTimeout`-backed sleep. If no timer can be armed (no global
    /// window), the future never resolves, which degrades to "no timeout".
    pub(super) struct Sleep {
        receiver: Option<futures_channel::oneshot::Receiver<()>>,
        timer_id: Option<i32>,
        _closure: Option<Closure<dyn FnMut()>>,
    }

    pub(super) fn sleep(duration: Duration) -> Sleep {
        let (sender, receiver) = futures_channel::oneshot::channel();
        let mut sender = Some(sender);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(sender) = sender.take() {
                let _ = sender.send(());
            }
        }) as Box<dyn FnMut()>);

        let timer_id = web_sys::window().and_then(|window| {
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    duration.as_millis() as i32,
                )
                .ok()
        });
        if timer_id.is_none() {
            tracing::warn!("could not arm a browser timer, request timeout disabled");
        }

        Sleep {
            receiver: Some(receiver),
            timer_id,
            _closure: Some(closure),
        }
    }

    impl Future for Sleep {
        type Output = ();

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            let this = self.get_mut();
            let Some(receiver) = this.receiver.as_mut() else {
                return Poll::Pending;
            };
            match Pin::new(receiver).poll(cx) {
                Poll::Ready(Ok(())) => {
                    this.receiver = None;
                    this.timer_id = None;
                    Poll::Ready(())
                }
                // Sender dropped without firing: the timer was never armed.
                Poll::Ready(Err(_)) => {
                    this.receiver = None;
                    Poll::Pending
                }
                Poll::Pending => Poll::Pending,
            }
        }
    }

    impl Drop for Sleep {
        fn drop(&mut self) {
            if let (Some(timer_id), Some(window)) = (self.timer_id.take(), web_sys::window()) {
                window.clear_timeout_with_handle(timer_id);
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_future_wins() {
        let result = timeout(Duration::from_millis(50), async { 42 }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_wins() {
        let result: Option<()> =
            timeout(Duration::from_millis(50), futures::future::pending()).await;
        assert_eq!(result, None);
    }
}
