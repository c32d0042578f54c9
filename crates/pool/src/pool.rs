use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, TrySendError};
use ssr_registry::RouteRegistry;
use ssr_schema::{RenderOutput, RenderTask};

use crate::cpu::{detect_cpu_count, sizing};
use crate::errors::PoolError;
use crate::metrics::{MetricsInner, WorkerGauges, WorkerPoolMetrics};
use crate::worker::{spawn_worker, QueueItem, WorkerHandle};

/// Lifecycle-manages a set of worker executors between `min_workers` and
/// `max_workers`, per `spec.md` §4.5. Owns the bounded task queue whose
/// capacity (`max_workers * queue_multiplier`) is the pool's sole
/// backpressure lever.
pub struct WorkerPool {
    registry: Arc<RouteRegistry>,
    min_workers: usize,
    max_workers: usize,
    idle_timeout: Duration,
    sender: crossbeam_channel::Sender<QueueItem>,
    receiver: crossbeam_channel::Receiver<QueueItem>,
    workers: Mutex<Vec<WorkerHandle>>,
    gauges: Arc<WorkerGauges>,
    metrics: Mutex<MetricsInner>,
    initialized: AtomicBool,
    closing: Arc<AtomicBool>,
    closed: AtomicBool,
    next_worker_id: AtomicU32,
}

/// Resolves `minWorkers`/`maxWorkers`/queue capacity from the environment,
/// applying the `WORKER_THREADS` override (if positive) ahead of CPU
/// detection, per `spec.md` §6.
#[must_use]
pub fn detect_sizing(worker_threads_override: Option<usize>) -> (usize, usize) {
    let cpu = worker_threads_override.unwrap_or_else(detect_cpu_count);
    sizing(cpu)
}

impl WorkerPool {
    /// Builds a pool sized per `min_workers`/`max_workers`, with a queue cap
    /// of `max_workers * queue_multiplier`. Does not start any worker threads
    /// yet — see [`WorkerPool::initialize`].
    #[must_use]
    pub fn new(
        registry: Arc<RouteRegistry>,
        min_workers: usize,
        max_workers: usize,
        idle_timeout: Duration,
        queue_multiplier: usize,
        rolling_window: usize,
    ) -> Self {
        let capacity = max_workers * queue_multiplier;
        let (sender, receiver) = bounded(capacity);

        Self {
            registry,
            min_workers,
            max_workers,
            idle_timeout,
            sender,
            receiver,
            workers: Mutex::new(Vec::new()),
            gauges: Arc::new(WorkerGauges::default()),
            metrics: Mutex::new(MetricsInner::new(rolling_window)),
            initialized: AtomicBool::new(false),
            closing: Arc::new(AtomicBool::new(false)),
            closed: AtomicBool::new(false),
            next_worker_id: AtomicU32::new(1),
        }
    }

    /// Spawns `min_workers` executors and blocks until each reports `Idle`
    /// (its warmup step). Idempotent within a single pool instance: calling
    /// it twice fails with [`PoolError::AlreadyInitialized`].
    pub fn initialize(&self) -> Result<(), PoolError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(PoolError::AlreadyInitialized);
        }

        let mut workers = self.workers.lock().unwrap();
        for _ in 0..self.min_workers {
            self.spawn_one(&mut workers);
        }
        drop(workers);

        self.await_warmup()
    }

    fn spawn_one(&self, workers: &mut Vec<WorkerHandle>) {
        let id = self.next_worker_id.fetch_add(1, Ordering::SeqCst);
        ssr_logging::info!("spawning worker {id}");
        let handle = spawn_worker(
            id,
            self.receiver.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.gauges),
            self.idle_timeout,
            self.min_workers,
            Arc::clone(&self.closing),
        );
        workers.push(handle);
    }

    fn await_warmup(&self) -> Result<(), PoolError> {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            if self.gauges.active() >= self.min_workers {
                return Ok(());
            }
            if std::time::Instant::now() > deadline {
                return Err(PoolError::WorkerInitFailed(
                    "worker warmup did not complete in time".to_string(),
                ));
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Enqueues `task` and blocks for the worker's reply. Grows the pool by
    /// one worker (up to `max_workers`) when no worker is currently idle.
    /// Fails immediately with [`PoolError::QueueFull`] when the queue is at
    /// capacity — the caller (C6) is expected to fall back to inline
    /// rendering on this specific error.
    pub fn submit(&self, task: RenderTask) -> Result<RenderOutput, PoolError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::PoolClosed);
        }

        self.maybe_grow();

        let (reply_tx, reply_rx) = bounded(1);
        match self.sender.try_send(QueueItem { task, reply_tx }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(PoolError::QueueFull),
            Err(TrySendError::Disconnected(_)) => return Err(PoolError::PoolClosed),
        }

        self.metrics.lock().unwrap().record_submitted();

        let result = match reply_rx.recv() {
            Ok(output) => {
                self.metrics
                    .lock()
                    .unwrap()
                    .record_completed(output.duration_ms, output.is_error());
                Ok(output)
            }
            Err(_) => {
                self.metrics.lock().unwrap().record_completed(0, true);
                Err(PoolError::WorkerDied)
            }
        };

        self.restore_min_workers();
        result
    }

    /// A worker that panics retires itself (worker.rs), which can shrink
    /// `activeWorkers` below `min_workers` with nothing else watching for
    /// it. Called opportunistically after every submission so the pool
    /// heals on its own usage rather than needing a dedicated janitor
    /// thread, per `spec.md` §4.5's "pool always restores pool size toward
    /// minWorkers".
    fn restore_min_workers(&self) {
        if self.gauges.active() >= self.min_workers {
            return;
        }
        let mut workers = self.workers.lock().unwrap();
        let deficit = self.min_workers.saturating_sub(self.gauges.active());
        if deficit > 0 {
            ssr_logging::warn!(
                "worker pool below min_workers (active={}, min={}), spawning {deficit} replacement(s)",
                self.gauges.active(),
                self.min_workers
            );
        }
        for _ in 0..deficit {
            self.spawn_one(&mut workers);
        }
    }

    fn maybe_grow(&self) {
        if self.gauges.idle() > 0 {
            return;
        }
        if self.gauges.active() >= self.max_workers {
            return;
        }
        let mut workers = self.workers.lock().unwrap();
        if self.gauges.active() < self.max_workers {
            self.spawn_one(&mut workers);
        }
    }

    /// A consistent snapshot of pool counters and gauges, safe to call
    /// concurrently with [`WorkerPool::submit`].
    #[must_use]
    pub fn metrics(&self) -> WorkerPoolMetrics {
        let inner = self.metrics.lock().unwrap();
        inner.snapshot(self.gauges.active(), self.gauges.idle(), self.sender.len())
    }

    /// True unless the rolling failure rate exceeds 10% of submissions.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.metrics.lock().unwrap().failure_rate() <= 0.10
    }

    #[must_use]
    pub fn min_workers(&self) -> usize {
        self.min_workers
    }

    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.gauges.active()
    }

    /// Drains in-flight tasks, stops accepting new submissions, and waits for
    /// every worker thread to terminate. Submissions made after this returns
    /// fail with [`PoolError::PoolClosed`].
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.closing.store(true, Ordering::SeqCst);
        ssr_logging::info!("worker pool shutting down, draining {} worker(s)", self.gauges.active());

        let mut workers = self.workers.lock().unwrap();
        for worker in workers.iter_mut() {
            if let Some(handle) = worker.join_handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssr_registry::{RouteDefinitionBuilder, RouteRegistryBuilder};
    use ssr_schema::{HttpMethod, IncomingRequest};
    use std::collections::HashMap;

    fn simple_registry() -> Arc<RouteRegistry> {
        let route = RouteDefinitionBuilder::new(
            "Simple",
            "^/test/simple$",
            Arc::new(|_d: &serde_json::Value, _c: &ssr_schema::RenderContext| {
                Ok("<!DOCTYPE html><html><body>ok</body></html>".to_string())
            }),
        )
        .build()
        .unwrap();
        Arc::new(RouteRegistryBuilder::new().register(route).unwrap().build())
    }

    fn build_task() -> RenderTask {
        let request = IncomingRequest::new("http://localhost:4321/test/simple", HttpMethod::Get);
        RenderTask::assemble(&request, "Simple", serde_json::Value::Null, HashMap::new()).unwrap()
    }

    #[test]
    fn initialize_spawns_at_least_min_workers() {
        let pool = WorkerPool::new(simple_registry(), 2, 4, Duration::from_secs(30), 4, 100);
        pool.initialize().unwrap();
        assert!(pool.active_workers() >= 2);
        pool.shutdown();
    }

    #[test]
    fn double_initialize_fails() {
        let pool = WorkerPool::new(simple_registry(), 1, 2, Duration::from_secs(30), 4, 100);
        pool.initialize().unwrap();
        assert!(matches!(pool.initialize(), Err(PoolError::AlreadyInitialized)));
        pool.shutdown();
    }

    #[test]
    fn submit_returns_worker_rendered_output() {
        let pool = WorkerPool::new(simple_registry(), 1, 2, Duration::from_secs(30), 4, 100);
        pool.initialize().unwrap();

        let output = pool.submit(build_task()).unwrap();
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "<!DOCTYPE html><html><body>ok</body></html>");
        assert!(output.worker_id >= 1);
        assert!(pool.is_healthy());

        pool.shutdown();
    }

    #[test]
    fn shutdown_causes_subsequent_submits_to_fail_with_pool_closed() {
        let pool = WorkerPool::new(simple_registry(), 1, 2, Duration::from_secs(30), 4, 100);
        pool.initialize().unwrap();
        pool.shutdown();

        let err = pool.submit(build_task()).unwrap_err();
        assert!(matches!(err, PoolError::PoolClosed));
    }

    #[test]
    fn panicking_renderer_restores_active_workers_toward_min() {
        let route = RouteDefinitionBuilder::new(
            "Boom",
            "^/boom$",
            Arc::new(|_d: &serde_json::Value, _c: &ssr_schema::RenderContext| -> Result<String, ssr_registry::RenderError> {
                panic!("boom");
            }),
        )
        .build()
        .unwrap();
        let registry = Arc::new(RouteRegistryBuilder::new().register(route).unwrap().build());
        let pool = WorkerPool::new(registry, 1, 1, Duration::from_secs(30), 4, 100);
        pool.initialize().unwrap();

        let request = IncomingRequest::new("http://localhost/boom", HttpMethod::Get);
        let task = RenderTask::assemble(&request, "Boom", serde_json::Value::Null, HashMap::new()).unwrap();

        let output = pool.submit(task).unwrap();
        assert_eq!(output.status, 500);
        assert!(output.error.as_deref().unwrap_or("").contains("panicked"));

        // The panicking worker decrements its gauge and retires before
        // replying, so submit() already sees the deficit and spawns a
        // replacement; poll briefly for that new thread to report active.
        let deadline = std::time::Instant::now() + Duration::from_secs(1);
        while pool.active_workers() < pool.min_workers() {
            assert!(std::time::Instant::now() < deadline, "pool never restored toward min_workers");
            std::thread::sleep(Duration::from_millis(5));
        }

        pool.shutdown();
    }

    #[test]
    fn queue_cap_is_enforced_when_workers_are_saturated() {
        // A single worker with a busy-looping renderer and a cap of
        // max_workers * queue_multiplier = 1 * 1 = 1 leaves no room once the
        // one worker is running and one task is already queued.
        let route = RouteDefinitionBuilder::new(
            "Slow",
            "^/slow$",
            Arc::new(|_d: &serde_json::Value, _c: &ssr_schema::RenderContext| {
                std::thread::sleep(Duration::from_millis(200));
                Ok("<p>slow</p>".to_string())
            }),
        )
        .build()
        .unwrap();
        let registry = Arc::new(RouteRegistryBuilder::new().register(route).unwrap().build());

        let pool = Arc::new(WorkerPool::new(registry, 1, 1, Duration::from_secs(30), 1, 100));
        pool.initialize().unwrap();

        let request = IncomingRequest::new("http://localhost/slow", HttpMethod::Get);
        let task = || RenderTask::assemble(&request, "Slow", serde_json::Value::Null, HashMap::new()).unwrap();

        let pool_a = Arc::clone(&pool);
        let task_a = task();
        let first = std::thread::spawn(move || pool_a.submit(task_a));
        std::thread::sleep(Duration::from_millis(20));

        let pool_b = Arc::clone(&pool);
        let task_b = task();
        let second = std::thread::spawn(move || pool_b.submit(task_b));
        std::thread::sleep(Duration::from_millis(20));

        // Queue capacity 1 is already occupied by the second task while the
        // first is running; a third submit must observe QueueFull.
        let third = pool.submit(task());
        assert!(matches!(third, Err(PoolError::QueueFull)));

        first.join().unwrap().unwrap();
        second.join().unwrap().unwrap();
        pool.shutdown();
    }
}
