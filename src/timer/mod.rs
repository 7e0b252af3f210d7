// One-shot timers over tokio::time
//
// Timers sleep on the tokio clock, so tests can drive them with a paused
// runtime (`#[tokio::test(start_paused = true)]`).

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Run `task` once after `delay`.
pub fn arm<F>(delay: Duration, task: F) -> TimerHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        task.await;
    });
    TimerHandle { task: handle }
}

/// An armed timer. Dropping the handle does not cancel it.
#[must_use = "call detach() to let the timer run unobserved"]
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stop the timer. A no-op if it already fired.
    pub fn cancel(self) {
        self.task.abort();
    }

    /// Let the timer run to completion without keeping the handle.
    pub fn detach(self) {}

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Holder for at most one armed timer.
#[derive(Debug, Default)]
pub struct TimerSlot {
    current: Option<TimerHandle>,
}

impl TimerSlot {
    /// Cancel whatever is armed and arm a new timer.
    pub fn reset<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.current = Some(arm(delay, task));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    /// Forget the armed timer without cancelling it.
    ///
    /// Used by a timer's own task, which must not abort itself.
    pub fn clear(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.detach();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}
