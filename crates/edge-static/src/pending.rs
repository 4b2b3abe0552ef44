//! Tracking of in-flight renders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Counts renders a worker has accepted but not finished.
#[derive(Debug, Clone, Default)]
pub struct PendingRenders {
    inner: Arc<Inner>,
}

impl PendingRenders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a render. It stays pending until the guard is dropped.
    pub fn track(&self) -> PendingGuard {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
        PendingGuard {
            inner: self.inner.clone(),
        }
    }

    /// Renders currently pending.
    pub fn len(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until no render is pending.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one render as pending; dropping it settles the render.
#[derive(Debug)]
pub struct PendingGuard {
    inner: Arc<Inner>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_idle_when_nothing_pending() {
        let pending = PendingRenders::new();

        tokio::time::timeout(Duration::from_millis(100), pending.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_idle_waits_for_every_guard() {
        let pending = PendingRenders::new();
        let first = pending.track();
        let second = pending.track();
        assert_eq!(pending.len(), 2);

        let waiter = {
            let pending = pending.clone();
            tokio::spawn(async move { pending.wait_idle().await })
        };

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(second);
        tokio::time::timeout(Duration::from_millis(500), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(pending.is_empty());
    }
}
