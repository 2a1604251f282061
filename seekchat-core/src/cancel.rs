//! Cooperative cancellation for in-flight chat calls

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type Subscriber = Box<dyn FnOnce() + Send>;

/// One-way cancellation signal shared between a caller and a running call.
///
/// Cloning is cheap and every clone observes the same state. Once
/// [`cancel`](Self::cancel) has been called the token stays cancelled.
/// The chat client polls the token before each network read and before
/// delivering each decoded chunk; it never forcibly aborts a read.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    cancelled: AtomicBool,
    notify: Notify,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation. Subsequent calls are no-ops.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let subscribers = {
            let mut guard = self
                .inner
                .subscribers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *guard)
        };
        for subscriber in subscribers {
            subscriber();
        }

        self.inner.notify.notify_waiters();
    }

    /// Run `callback` once when the token is cancelled.
    ///
    /// If the token is already cancelled the callback runs immediately on
    /// the calling thread.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut guard = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.is_cancelled() {
            drop(guard);
            callback();
        } else {
            guard.push(Box::new(callback));
        }
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancel_is_terminal_and_idempotent() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();

        other.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_subscribers_run_exactly_once() {
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        token.cancel();
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_subscriber_runs_immediately() {
        let token = CancellationToken::new();
        token.cancel();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_future_wakes() {
        let token = CancellationToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            "cancelled"
        });

        tokio::task::yield_now().await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), "cancelled");
    }

    #[test]
    fn test_cancelled_returns_when_already_set() {
        let token = CancellationToken::new();
        token.cancel();
        tokio_test::block_on(token.cancelled());
    }
}
