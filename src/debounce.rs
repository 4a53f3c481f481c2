use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A cancellable one-shot timer for debounced work.
///
/// Each schedule owns its own handle; superseding a pending schedule is
/// an explicit `cancel` on the old handle followed by a fresh
/// `schedule`, so nothing rides on closure capture order.
///
/// The handle only owns the delay. At fire time the action is handed
/// off to a detached task, so cancellation can suppress an action that
/// has not started yet but can never reach one that has.
#[derive(Debug)]
pub struct DebounceTimer {
    handle: JoinHandle<()>,
}

impl DebounceTimer {
    /// Run `action` after `delay`, unless cancelled (or dropped) first.
    pub fn schedule<F>(delay: Duration, action: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        });
        Self { handle }
    }

    /// Cancel the timer. No-op once the action has been handed off.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the timer has neither fired nor been cancelled yet.
    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
