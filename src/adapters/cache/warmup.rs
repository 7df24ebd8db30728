//! Supervisor for background cache warm-up tasks.
//!
//! Each task runs on its own `tokio::spawn` under its own deadline, so the
//! request that triggered it can neither observe its failure nor cancel it.
//! Handles are kept so shutdown and tests can wait for outstanding work.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Tracks spawned warm-up tasks.
#[derive(Debug, Default)]
pub struct WarmupTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WarmupTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `work` bounded by `deadline`. A timeout is logged and the work
    /// is dropped.
    pub fn spawn<F>(&self, label: &'static str, deadline: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if tokio::time::timeout(deadline, work).await.is_err() {
                tracing::warn!(
                    task = label,
                    deadline_ms = deadline.as_millis() as u64,
                    "Cache warm-up timed out"
                );
            }
        });

        let mut handles = self.handles();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks still running.
    pub fn in_flight(&self) -> usize {
        self.handles().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every task spawned so far.
    pub async fn wait_idle(&self) {
        let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles());
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cache warm-up task panicked or was aborted");
            }
        }
    }

    /// Abort every task still running.
    pub fn abort_all(&self) {
        for handle in self.handles().drain(..) {
            handle.abort();
        }
    }

    fn handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
