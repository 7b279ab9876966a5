use super::*;
use crate::schedule::clock::MonotonicClock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Reschedules itself every `interval` ticks until it has run `limit` times.
struct Counter {
    runs: AtomicU64,
    limit: u64,
    interval: u64,
    seen: Mutex<Vec<u64>>,
}

impl Counter {
    fn new(limit: u64, interval: u64) -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicU64::new(0),
            limit,
            interval,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Activity for Counter {
    fn activity(&self, now: u64) -> u64 {
        lock(&self.seen).push(now);
        let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.limit { 0 } else { now + self.interval }
    }
}

fn wait_for(mut done: impl FnMut() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(start.elapsed() < Duration::from_secs(5), "timed out");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn manual_executor_runs_in_deadline_order() {
    let exec = ManualExecutor::new(100);
    let a = Counter::new(10, 50);
    let b = Counter::new(10, 70);
    exec.submit(a.clone());
    exec.submit(b.clone());

    assert_eq!(exec.advance_to(100), 2);
    assert_eq!(exec.next_due(), Some(150));
    assert_eq!(exec.advance_to(240), 4);

    assert_eq!(*lock(&a.seen), vec![100, 150, 200]);
    assert_eq!(*lock(&b.seen), vec![100, 170, 240]);
    assert_eq!(exec.now(), 240);
}

#[test]
fn zero_deadline_drops_the_activity() {
    let exec = ManualExecutor::new(1);
    let a = Counter::new(2, 10);
    exec.submit(a.clone());

    exec.advance_to(1_000);
    assert_eq!(a.runs(), 2);
    assert_eq!(exec.pending(), 0);
    assert!(!exec.run_next());
}

#[test]
fn revoke_removes_pending_submission() {
    let exec = ManualExecutor::new(1);
    let a = Counter::new(10, 10);
    let id = exec.submit(a.clone());
    exec.revoke(id);
    exec.revoke(id);

    assert_eq!(exec.advance_to(1_000), 0);
    assert_eq!(a.runs(), 0);
}

struct RevokesItself {
    exec: Arc<ManualExecutor>,
    id: Mutex<Option<ActivityId>>,
}

impl Activity for RevokesItself {
    fn activity(&self, now: u64) -> u64 {
        if let Some(id) = *lock(&self.id) {
            self.exec.revoke(id);
        }
        now + 10
    }
}

#[test]
fn revoke_during_activation_discards_returned_deadline() {
    let exec = Arc::new(ManualExecutor::new(1));
    let act = Arc::new(RevokesItself {
        exec: exec.clone(),
        id: Mutex::new(None),
    });
    let id = exec.submit(act.clone());
    *lock(&act.id) = Some(id);

    assert!(exec.run_next());
    assert_eq!(exec.pending(), 0);
}

#[test]
fn dispatched_activation_is_not_requeued() {
    let exec = ManualExecutor::new(5);
    exec.submit(Counter::new(10, 10));

    let (due, act) = exec.dispatch_next().unwrap();
    assert_eq!(due, 5);
    assert_eq!(act.activity(due), 15);
    assert_eq!(exec.pending(), 0);
}

#[test]
fn simple_worker_reschedules_until_zero() {
    let worker = SimpleWorker::spawn(Arc::new(MonotonicClock::new())).unwrap();
    let a = Counter::new(5, 1_000);
    worker.submit(a.clone());

    wait_for(|| a.runs() == 5);
    std::thread::sleep(Duration::from_millis(10));
    assert_eq!(a.runs(), 5);
    assert_eq!(worker.pending(), 0);

    let seen = lock(&a.seen).clone();
    for pair in seen.windows(2) {
        assert!(pair[1] >= pair[0] + 1_000);
    }
}

#[test]
fn simple_worker_revoke_stops_future_activations() {
    let worker = SimpleWorker::spawn(Arc::new(MonotonicClock::new())).unwrap();
    let a = Counter::new(u64::MAX, 2_000);
    let id = worker.submit(a.clone());

    wait_for(|| a.runs() >= 2);
    worker.revoke(id);
    // An invocation already in flight may still finish.
    std::thread::sleep(Duration::from_millis(5));
    let after = a.runs();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(a.runs(), after);
    assert_eq!(worker.pending(), 0);
}

#[test]
fn dropping_worker_joins_its_thread() {
    let worker = SimpleWorker::spawn(Arc::new(MonotonicClock::new())).unwrap();
    let a = Counter::new(u64::MAX, 1_000_000);
    worker.submit(a.clone());
    wait_for(|| a.runs() >= 1);
    drop(worker);
    assert_eq!(Arc::strong_count(&a), 1);
}
