//! Cancellable timers for the walk loop
//!
//! Dwell timers and the walk clock run as tokio tasks that only send a
//! message back to the session loop. The scheduler keeps their join handles
//! so the loop can cancel one task (leaving a mission radius) or all of them
//! (session end) without waiting for them to fire.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Identifier of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Handle to a task registered with a [`TaskScheduler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    id: TaskId,
    name: String,
}

impl ScheduledTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Entry {
    name: String,
    handle: JoinHandle<()>,
}

type Tasks = Arc<Mutex<HashMap<TaskId, Entry>>>;

/// Owner of the session's timers
///
/// Must be used from within a tokio runtime. Dropping the scheduler aborts
/// every task it still owns.
#[derive(Default)]
pub struct TaskScheduler {
    next_id: AtomicU64,
    tasks: Tasks,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once after `delay`
    pub fn schedule_once<F>(&self, name: impl Into<String>, delay: Duration, task: F) -> ScheduledTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.allocate_id();
        let name = name.into();
        let tasks = Arc::clone(&self.tasks);

        // The map lock is held across the spawn so a zero-delay task cannot
        // deregister itself before it has been registered
        let mut guard = self.tasks.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
            tasks.lock().remove(&id);
        });
        guard.insert(
            id,
            Entry {
                name: name.clone(),
                handle,
            },
        );
        drop(guard);

        debug!(%id, name = %name, ?delay, "scheduled one-shot task");
        ScheduledTask { id, name }
    }

    /// Call `task` every `period`, first after one full period
    ///
    /// A zero period is clamped to one millisecond.
    pub fn schedule_repeating<F, Fut>(
        &self,
        name: impl Into<String>,
        period: Duration,
        mut task: F,
    ) -> ScheduledTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.allocate_id();
        let name = name.into();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!(%id, "repeating task tick");
                task().await;
            }
        });
        self.tasks.lock().insert(
            id,
            Entry {
                name: name.clone(),
                handle,
            },
        );

        debug!(%id, name = %name, ?period, "scheduled repeating task");
        ScheduledTask { id, name }
    }

    /// Cancel one task; returns false if it already ran or was cancelled
    pub fn cancel(&self, id: TaskId) -> bool {
        match self.tasks.lock().remove(&id) {
            Some(entry) => {
                entry.handle.abort();
                debug!(%id, name = %entry.name, "cancelled task");
                true
            }
            None => false,
        }
    }

    /// Cancel every pending task; returns how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.tasks.lock().drain().collect();
        for (_, entry) in &drained {
            entry.handle.abort();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "cancelled all tasks");
        }
        drained.len()
    }

    /// Tasks that have not yet run to completion or been cancelled
    pub fn active_count(&self) -> usize {
        self.tasks.lock().len()
    }

    fn allocate_id(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for (_, entry) in self.tasks.lock().drain() {
            entry.handle.abort();
        }
    }
}
