use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-shot broadcast event.
#[derive(Debug, Default)]
pub struct Signal {
    fired: AtomicBool,
    notification: Notify,
}

impl Signal {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Fires the signal. Returns false if it had already been fired.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.notification.notify_waiters();
        true
    }

    pub async fn wait(&self) {
        loop {
            // register before checking the flag so a concurrent `fire` is not missed
            let notified = self.notification.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_fired() {
                return;
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures_util::FutureExt;

    use super::*;

    #[test]
    fn fires_once() {
        let signal = Signal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(signal.is_fired());
        assert!(!signal.fire());
    }

    #[tokio::test]
    async fn wait_returns_after_fire() {
        let signal = Signal::new();
        signal.fire();
        signal.wait().await;
        signal.wait().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn wakes_every_waiter() {
        let signal = Arc::new(Signal::new());

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let signal = signal.clone();
                tokio::spawn(async move { signal.wait().await })
            })
            .collect();

        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        assert!(waiters.iter().all(|w| !w.is_finished()));

        signal.fire();
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn wait_blocks_while_unset() {
        let signal = Signal::new();
        assert!(signal.wait().now_or_never().is_none());

        signal.fire();
        assert!(signal.wait().now_or_never().is_some());
    }
}
