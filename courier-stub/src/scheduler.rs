//! Delivery schedulers.
//!
//! The stub backend never completes a request inside `request` itself. It
//! hands a [`Task`] to a [`Scheduler`] instead, which decides when (and on
//! which thread) the task runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::trace;

/// Unit of work run by a scheduler.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync {
    /// Runs `task` once `delay` has elapsed.
    ///
    /// A zero delay still runs the task later, never inside this call.
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledHandle;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledHandle {
        (**self).schedule(delay, task)
    }
}

/// Handle to a scheduled task.
///
/// Dropping the handle leaves the task scheduled; [`dispose`](Self::dispose)
/// withdraws it if it has not started yet.
#[must_use = "dropping the handle does not cancel the task"]
pub struct ScheduledHandle {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl ScheduledHandle {
    /// Handle that runs `dispose` when disposed.
    pub fn new<F>(dispose: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// Handle with nothing to withdraw.
    pub fn detached() -> Self {
        Self { dispose: None }
    }

    /// Withdraws the task.
    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for ScheduledHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledHandle")
            .field("disposable", &self.dispose.is_some())
            .finish()
    }
}

/// Scheduler backed by tokio timers.
///
/// Tasks are spawned on the configured runtime handle, or on the runtime
/// current at scheduling time. Outside any runtime a plain thread sleeps for
/// the delay instead.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    handle: Option<Handle>,
}

impl TokioScheduler {
    /// Scheduler using the runtime current at scheduling time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler pinned to a runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledHandle {
        let runtime = self.handle.clone().or_else(|| Handle::try_current().ok());

        match runtime {
            Some(runtime) => {
                let join = runtime.spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    task();
                });
                let abort = join.abort_handle();
                ScheduledHandle::new(move || abort.abort())
            }
            None => {
                trace!(?delay, "no tokio runtime, scheduling on a thread");
                let disposed = Arc::new(AtomicBool::new(false));
                let flag = disposed.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    if !flag.load(Ordering::SeqCst) {
                        task();
                    }
                });
                ScheduledHandle::new(move || disposed.store(true, Ordering::SeqCst))
            }
        }
    }
}

#[derive(Default)]
struct Clock {
    now: Duration,
    sequence: u64,
    tasks: BTreeMap<(Duration, u64), Task>,
}

/// Scheduler driven by a virtual clock.
///
/// Time only moves when [`advance`](Self::advance) or
/// [`advance_to`](Self::advance_to) is called; due tasks then run on the
/// calling thread in deadline order (ties in scheduling order). Clones share
/// the same clock.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::time::Duration;
/// use courier_stub::{Scheduler, VirtualScheduler};
///
/// let clock = VirtualScheduler::new();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = fired.clone();
/// let _handle = clock.schedule(
///     Duration::from_secs(2),
///     Box::new(move || flag.store(true, Ordering::SeqCst)),
/// );
///
/// clock.advance(Duration::from_millis(1500));
/// assert!(!fired.load(Ordering::SeqCst));
/// clock.advance(Duration::from_millis(500));
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    clock: Arc<Mutex<Clock>>,
}

impl VirtualScheduler {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Number of tasks waiting to run.
    pub fn pending_count(&self) -> usize {
        self.clock.lock().tasks.len()
    }

    /// Moves the clock forward by `by`, running every task that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Moves the clock to `deadline`, running every task that falls due.
    ///
    /// Tasks scheduled by running tasks are picked up if they are due by
    /// `deadline`. The clock never moves backwards.
    pub fn advance_to(&self, deadline: Duration) {
        loop {
            let task = {
                let mut clock = self.clock.lock();
                let due = clock
                    .tasks
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(at, _)| *at <= deadline);
                match due {
                    Some(key) => {
                        clock.now = clock.now.max(key.0);
                        clock.tasks.remove(&key)
                    }
                    None => {
                        clock.now = clock.now.max(deadline);
                        None
                    }
                }
            };

            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Runs the tasks due at the current time.
    pub fn run_pending(&self) {
        let now = self.now();
        self.advance_to(now);
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledHandle {
        let key = {
            let mut clock = self.clock.lock();
            let key = (clock.now + delay, clock.sequence);
            clock.sequence += 1;
            clock.tasks.insert(key, task);
            key
        };
        trace!(at = ?key.0, "task scheduled on virtual clock");

        let clock: Weak<Mutex<Clock>> = Arc::downgrade(&self.clock);
        ScheduledHandle::new(move || {
            if let Some(clock) = clock.upgrade() {
                let removed = clock.lock().tasks.remove(&key);
                drop(removed);
            }
        })
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.lock();
        f.debug_struct("VirtualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.tasks.len())
            .finish()
    }
}
