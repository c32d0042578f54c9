use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use ssr_registry::RouteRegistry;
use ssr_schema::RenderOutput;

use crate::metrics::WorkerGauges;

/// Worker executor lifecycle, per `spec.md` §4.5 "State machine".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Spawning,
    Loading,
    Idle,
    Running,
    Retiring,
    Terminated,
}

pub(crate) struct QueueItem {
    pub task: ssr_schema::RenderTask,
    pub reply_tx: Sender<RenderOutput>,
}

pub(crate) struct WorkerHandle {
    pub id: u32,
    pub state: Arc<Mutex<WorkerState>>,
    pub join_handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn current_state(&self) -> WorkerState {
        *self.state.lock().unwrap()
    }
}

/// Spawns one worker executor listening on `queue`. `min_workers` governs
/// whether this worker retires on idle timeout: the pool always restores
/// itself toward `min_workers`, so a worker at or below that floor keeps
/// waiting instead of retiring.
#[allow(clippy::too_many_arguments)]
pub(crate) fn spawn_worker(
    id: u32,
    queue: Receiver<QueueItem>,
    registry: Arc<RouteRegistry>,
    gauges: Arc<WorkerGauges>,
    idle_timeout: Duration,
    min_workers: usize,
    closing: Arc<AtomicBool>,
) -> WorkerHandle {
    let state = Arc::new(Mutex::new(WorkerState::Spawning));
    let thread_state = Arc::clone(&state);

    let join_handle = std::thread::Builder::new()
        .name(format!("ssr-worker-{id}"))
        .spawn(move || {
            *thread_state.lock().unwrap() = WorkerState::Loading;
            // Warmup: the registry is already fully built by the time it
            // reaches here, so "loading" completes immediately; a real
            // per-worker import step would do its work in this window.
            *thread_state.lock().unwrap() = WorkerState::Idle;
            gauges.active.fetch_add(1, Ordering::Relaxed);
            ssr_logging::info!("worker {id} idle, ready to accept tasks");

            // Polled at a short, fixed tick rather than `idle_timeout`
            // itself so a shutdown request is noticed quickly regardless of
            // how long the configured idle timeout is; actual idle-timeout
            // retirement is tracked against `idle_since` below.
            let tick = Duration::from_millis(50).min(idle_timeout);
            let mut idle_since = std::time::Instant::now();
            let mut already_retired = false;

            loop {
                gauges.idle.fetch_add(1, Ordering::Relaxed);
                let received = queue.recv_timeout(tick);
                gauges.idle.fetch_sub(1, Ordering::Relaxed);

                match received {
                    Ok(item) => {
                        *thread_state.lock().unwrap() = WorkerState::Running;
                        let reply_tx = item.reply_tx;
                        let task = item.task;
                        match catch_unwind(AssertUnwindSafe(|| execute_task(&registry, task, id))) {
                            Ok(output) => {
                                let _ = reply_tx.send(output);
                                *thread_state.lock().unwrap() = WorkerState::Idle;
                                idle_since = std::time::Instant::now();
                            }
                            Err(payload) => {
                                let message = panic_message(&payload);
                                ssr_logging::error!("worker {id} panicked while rendering: {message}");
                                // Decrement and retire before replying so a caller that
                                // wakes on the reply never observes a stale active count.
                                *thread_state.lock().unwrap() = WorkerState::Retiring;
                                gauges.active.fetch_sub(1, Ordering::Relaxed);
                                *thread_state.lock().unwrap() = WorkerState::Terminated;
                                already_retired = true;
                                let _ = reply_tx.send(panic_output(id, &message));
                                break;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if closing.load(Ordering::Relaxed) {
                            break;
                        }
                        let active = gauges.active();
                        if active > min_workers && idle_since.elapsed() >= idle_timeout {
                            ssr_logging::info!("worker {id} retiring after idle timeout");
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            if !already_retired {
                *thread_state.lock().unwrap() = WorkerState::Retiring;
                gauges.active.fetch_sub(1, Ordering::Relaxed);
                *thread_state.lock().unwrap() = WorkerState::Terminated;
            }
        })
        .expect("failed to spawn worker thread");

    WorkerHandle {
        id,
        state,
        join_handle: Some(join_handle),
    }
}

/// Best-effort extraction of a human-readable message from a caught panic
/// payload; renderer panics typically carry a `&'static str` or `String`.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "renderer panicked with a non-string payload".to_string()
    }
}

fn panic_output(worker_id: u32, message: &str) -> RenderOutput {
    RenderOutput {
        status: 500,
        reason: "Internal Server Error".to_string(),
        headers: std::collections::HashMap::new(),
        body: "<!DOCTYPE html><html><body>internal error</body></html>".to_string(),
        duration_ms: 0,
        worker_id,
        error: Some(format!("worker panicked: {message}")),
    }
}

fn execute_task(registry: &RouteRegistry, task: ssr_schema::RenderTask, worker_id: u32) -> RenderOutput {
    let Some(route) = registry.by_name(&task.route_name) else {
        return RenderOutput {
            status: 500,
            reason: "Internal Server Error".to_string(),
            headers: std::collections::HashMap::new(),
            body: "<!DOCTYPE html><html><body>unknown route</body></html>".to_string(),
            duration_ms: 0,
            worker_id,
            error: Some(format!("route '{}' not found in worker registry", task.route_name)),
        };
    };

    let ctx = task.reconstruct();
    let outcome = ssr_stages::render(route, &task.data, &ctx);

    if let Some(error) = outcome.error {
        RenderOutput {
            status: 500,
            reason: "Internal Server Error".to_string(),
            headers: std::collections::HashMap::new(),
            body: outcome.html,
            duration_ms: outcome.duration_ms,
            worker_id,
            error: Some(error.to_string()),
        }
    } else {
        RenderOutput::ok(outcome.html, outcome.duration_ms, worker_id)
    }
}
