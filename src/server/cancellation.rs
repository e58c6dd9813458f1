//! Cooperative request cancellation.
//!
//! Every navigation/completion request carries a token; the resolution
//! core checks it at file-read boundaries and abandons the request rather
//! than returning a partial result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    notify: broadcast::Sender<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify,
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // No receivers is fine; the flag alone settles is_cancelled().
        let _ = self.inner.notify.send(());
    }

    /// Waits until cancellation is signaled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let mut receiver = self.inner.notify.subscribe();
        if self.is_cancelled() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
