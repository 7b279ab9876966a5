//! Cooperative periodic-task executors.
//!
//! An [`Activity`] is invoked with the current tick count and answers with the absolute tick at
//! which it wants to run again, or `0` to be dropped. [`SimpleWorker`] runs activities on one
//! background thread; [`ManualExecutor`] runs them only when told to, on the caller's thread.

use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread::JoinHandle,
    time::Duration,
};

use anyhow::Context as _;
use tracing::{debug, trace};

use crate::{
    foundation::error::RenderTestResult, foundation::sync::lock, schedule::clock::Clock,
    trace::SCHEDULE,
};

/// Callback invoked by an executor.
pub trait Activity: Send + Sync {
    /// Run once at `now`. Returns the next absolute deadline, `0` for "do not reschedule".
    fn activity(&self, now: u64) -> u64;
}

/// Handle of one submission, used to revoke it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActivityId(u64);

/// Something that runs activities at their requested deadlines.
pub trait Executor: Send + Sync {
    /// Current time in the executor's ticks.
    fn now(&self) -> u64;

    /// Queue `activity` to run as soon as possible.
    fn submit(&self, activity: Arc<dyn Activity>) -> ActivityId;

    /// Drop a submission. Never waits for an invocation that is already running; such an
    /// invocation finishes, but its returned deadline is discarded.
    fn revoke(&self, id: ActivityId);
}

struct Pending {
    id: ActivityId,
    due: u64,
    activity: Arc<dyn Activity>,
}

struct InFlight {
    id: ActivityId,
    revoked: bool,
}

#[derive(Default)]
struct Queue {
    next_id: u64,
    pending: Vec<Pending>,
    in_flight: Option<InFlight>,
    shutdown: bool,
}

impl Queue {
    fn push_new(&mut self, due: u64, activity: Arc<dyn Activity>) -> ActivityId {
        self.next_id += 1;
        let id = ActivityId(self.next_id);
        self.pending.push(Pending { id, due, activity });
        id
    }

    fn revoke(&mut self, id: ActivityId) {
        self.pending.retain(|p| p.id != id);
        if let Some(f) = self.in_flight.as_mut()
            && f.id == id
        {
            f.revoked = true;
        }
    }

    /// Index and deadline of the earliest pending entry.
    fn earliest(&self) -> Option<(usize, u64)> {
        self.pending
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.due)
            .map(|(i, p)| (i, p.due))
    }

    fn start(&mut self, idx: usize) -> Pending {
        let job = self.pending.swap_remove(idx);
        self.in_flight = Some(InFlight {
            id: job.id,
            revoked: false,
        });
        job
    }

    /// Requeue a finished job unless it asked to stop or was revoked while running.
    fn finish(&mut self, job: Pending, next_due: u64) {
        let revoked = self.in_flight.take().is_some_and(|f| f.revoked);
        if next_due != 0 && !revoked && !self.shutdown {
            self.pending.push(Pending {
                due: next_due,
                ..job
            });
        }
    }
}

struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
    clock: Arc<dyn Clock>,
}

/// Single background thread running submitted activities at their deadlines.
///
/// The thread logs into whatever `tracing` dispatcher was the default on the spawning thread.
pub struct SimpleWorker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl SimpleWorker {
    pub fn spawn(clock: Arc<dyn Clock>) -> RenderTestResult<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            wake: Condvar::new(),
            clock,
        });

        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let worker_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("simple-worker".to_owned())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || run(&worker_shared));
            })
            .context("spawn simple-worker thread")?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Number of queued (not running) submissions.
    pub fn pending(&self) -> usize {
        lock(&self.shared.queue).pending.len()
    }
}

fn run(shared: &Shared) {
    debug!(target: SCHEDULE, "worker started");
    let mut queue = lock(&shared.queue);
    loop {
        if queue.shutdown {
            break;
        }

        let now = shared.clock.now_ticks();
        match queue.earliest() {
            None => {
                queue = shared
                    .wake
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            Some((_, due)) if due > now => {
                let timeout = Duration::from_micros(due - now);
                queue = match shared.wake.wait_timeout(queue, timeout) {
                    Ok((guard, _)) => guard,
                    Err(poisoned) => poisoned.into_inner().0,
                };
            }
            Some((idx, _)) => {
                let job = queue.start(idx);
                drop(queue);

                let now = shared.clock.now_ticks();
                trace!(target: SCHEDULE, now, "activation");
                let next_due = job.activity.activity(now);

                queue = lock(&shared.queue);
                queue.finish(job, next_due);
            }
        }
    }
    debug!(target: SCHEDULE, "worker stopped");
}

impl Executor for SimpleWorker {
    fn now(&self) -> u64 {
        self.shared.clock.now_ticks()
    }

    fn submit(&self, activity: Arc<dyn Activity>) -> ActivityId {
        let now = self.now();
        let id = lock(&self.shared.queue).push_new(now, activity);
        self.shared.wake.notify_one();
        id
    }

    fn revoke(&self, id: ActivityId) {
        lock(&self.shared.queue).revoke(id);
        self.shared.wake.notify_one();
    }
}

impl Drop for SimpleWorker {
    fn drop(&mut self) {
        {
            let mut queue = lock(&self.shared.queue);
            queue.shutdown = true;
            queue.pending.clear();
        }
        self.shared.wake.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Executor driven explicitly by its owner, for deterministic stepping.
///
/// Activations receive their own deadline as `now`, so a scheduled loop sees perfectly regular
/// frame times.
pub struct ManualExecutor {
    now: Mutex<u64>,
    queue: Mutex<Queue>,
}

impl ManualExecutor {
    pub fn new(start: u64) -> Self {
        Self {
            now: Mutex::new(start),
            queue: Mutex::new(Queue::default()),
        }
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).pending.len()
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<u64> {
        lock(&self.queue).earliest().map(|(_, due)| due)
    }

    /// Remove the earliest due activation without running it, as if a worker had dispatched it.
    ///
    /// The caller invokes it whenever it likes; nothing is requeued.
    pub fn dispatch_next(&self) -> Option<(u64, Arc<dyn Activity>)> {
        let mut queue = lock(&self.queue);
        let (idx, _) = queue.earliest()?;
        let job = queue.pending.swap_remove(idx);
        Some((job.due, job.activity))
    }

    /// Run the earliest pending activation, if any. Returns whether one ran.
    pub fn run_next(&self) -> bool {
        let job = {
            let mut queue = lock(&self.queue);
            let Some((idx, _)) = queue.earliest() else {
                return false;
            };
            queue.start(idx)
        };

        let due = job.due;
        {
            let mut now = lock(&self.now);
            *now = (*now).max(due);
        }
        let next_due = job.activity.activity(due);
        lock(&self.queue).finish(job, next_due);
        true
    }

    /// Move time forward to `until`, running every activation due by then. Returns how many ran.
    pub fn advance_to(&self, until: u64) -> usize {
        let mut ran = 0;
        while self.next_due().is_some_and(|due| due <= until) {
            self.run_next();
            ran += 1;
        }
        let mut now = lock(&self.now);
        *now = (*now).max(until);
        ran
    }
}

impl Executor for ManualExecutor {
    fn now(&self) -> u64 {
        *lock(&self.now)
    }

    fn submit(&self, activity: Arc<dyn Activity>) -> ActivityId {
        let now = self.now();
        lock(&self.queue).push_new(now, activity)
    }

    fn revoke(&self, id: ActivityId) {
        lock(&self.queue).revoke(id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/worker.rs"]
mod tests;
