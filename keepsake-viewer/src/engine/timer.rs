//! Scoped driver tasks
//!
//! Every phase owns at most one driver task (its timers live inside that
//! task). Wrapping the JoinHandle in an abort-on-drop guard means replacing
//! the guard on a phase transition is what cancels the exiting phase's
//! timers; a leaked timer firing after the state has moved on is therefore
//! unrepresentable.

use std::future::Future;
use tokio::task::JoinHandle;

/// Abort-on-drop wrapper around a spawned task
pub struct TaskGuard {
    handle: JoinHandle<()>,
}

impl TaskGuard {
    /// Spawn a future and guard its handle
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Whether the task has already finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
