// Injectable one-shot timers used for debouncing
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

pub type TimerTask = BoxFuture<'static, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Start/cancel one-shot timers. Cancelling only prevents a task that has not
/// fired yet; once fired the task runs to completion.
pub trait Timer: Send + Sync {
    fn start(&self, delay: Duration, task: TimerTask) -> TimerId;

    fn cancel(&self, id: TimerId);
}

/// Wall-clock timer backed by the tokio runtime.
#[derive(Default)]
pub struct TokioTimer {
    next_id: AtomicU64,
    pending: Arc<Mutex<HashMap<TimerId, AbortHandle>>>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timer for TokioTimer {
    fn start(&self, delay: Duration, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let registry = self.pending.clone();

        // Held until the handle is registered so a zero delay cannot fire first
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let armed = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id)
                .is_some();
            if armed {
                // Detached so a later cancel can never abort the task mid-flight
                tokio::spawn(task);
            }
        });
        pending.insert(id, handle.abort_handle());
        id
    }

    fn cancel(&self, id: TimerId) {
        let handle = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Deterministic timer driven by [`ManualTimer::advance`]; nothing fires on its own.
#[derive(Default)]
pub struct ManualTimer {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    entries: Vec<ManualEntry>,
}

struct ManualEntry {
    id: TimerId,
    deadline: Duration,
    task: TimerTask,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().now
    }

    /// Move the clock forward and run every task that became due, in deadline
    /// order. Tasks armed by a running task fire too if they fall due.
    pub async fn advance(&self, by: Duration) {
        let target = self.lock().now + by;

        loop {
            let next = {
                let mut state = self.lock();
                let due = state
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.deadline <= target)
                    .min_by_key(|(_, e)| e.deadline)
                    .map(|(i, _)| i);
                match due {
                    Some(index) => {
                        let entry = state.entries.remove(index);
                        state.now = state.now.max(entry.deadline);
                        Some(entry.task)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            match next {
                Some(task) => task.await,
                None => break,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for ManualTimer {
    fn start(&self, delay: Duration, task: TimerTask) -> TimerId {
        let mut state = self.lock();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let deadline = state.now + delay;
        state.entries.push(ManualEntry { id, deadline, task });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.lock().entries.retain(|e| e.id != id);
    }
}
