//! Bounded pool for background verification and delivery work.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};

/// Spawns background tasks onto the Tokio runtime with a concurrency bound.
///
/// Spawning never blocks: a task waits for a permit inside the runtime.
/// [`TaskPool::wait_idle`] lets callers (mostly tests and shutdown) wait until
/// every spawned task, including tasks spawned by running tasks, has finished.
#[derive(Clone)]
pub struct TaskPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    permits: Arc<Semaphore>,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Releases an in-flight slot on drop, including when the task panics.
struct InFlightGuard(Arc<PoolInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl TaskPool {
    /// Create a pool running at most `max_concurrent` tasks at once.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Spawn a task. Must be called from within a Tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(self.inner.clone());
        let permits = self.inner.permits.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task.await;
        });
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no spawned task is pending or running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("in_flight", &self.in_flight())
            .field("available_permits", &self.inner.permits.available_permits())
            .finish()
    }
}
