//! Trailing-edge debouncer over cancellable tasks.
//!
//! Each `call` aborts the previously scheduled task, so of any burst of
//! calls only the last one runs, `delay` after it was scheduled. Aborting a
//! task that has already started does not roll back its effects; callers
//! needing that use request tokens on top.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `task` to run after the delay, cancelling any previously
    /// scheduled task that has not started yet.
    pub fn call<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the scheduled task, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    /// True while a scheduled task has neither run nor been cancelled.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("debouncer lock poisoned")
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
