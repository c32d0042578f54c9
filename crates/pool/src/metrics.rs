use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// A snapshot of pool-wide counters and gauges, per `spec.md` §3
/// "WorkerPoolMetrics". Confined to the main tier; never shared with workers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerPoolMetrics {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub active_workers: usize,
    pub idle_workers: usize,
    pub queue_depth: usize,
    pub average_duration_ms: f64,
}

/// Accumulates the counters behind a [`WorkerPoolMetrics`] snapshot. Kept
/// separate from the gauges, which are read straight off the pool's atomics,
/// matching the "single owning path, copy-on-read" pattern used for
/// [`ssr_config::PoolTuning`] style configuration state.
pub(crate) struct MetricsInner {
    submitted: u64,
    completed: u64,
    failed: u64,
    durations: VecDeque<u64>,
    window: usize,
}

impl MetricsInner {
    pub(crate) fn new(window: usize) -> Self {
        Self {
            submitted: 0,
            completed: 0,
            failed: 0,
            durations: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    pub(crate) fn record_submitted(&mut self) {
        self.submitted += 1;
    }

    pub(crate) fn record_completed(&mut self, duration_ms: u64, failed: bool) {
        self.completed += 1;
        if failed {
            self.failed += 1;
        }
        if self.durations.len() == self.window {
            self.durations.pop_front();
        }
        self.durations.push_back(duration_ms);
    }

    pub(crate) fn failure_rate(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            self.failed as f64 / self.submitted as f64
        }
    }

    pub(crate) fn average_duration_ms(&self) -> f64 {
        if self.durations.is_empty() {
            0.0
        } else {
            self.durations.iter().sum::<u64>() as f64 / self.durations.len() as f64
        }
    }

    pub(crate) fn snapshot(&self, active_workers: usize, idle_workers: usize, queue_depth: usize) -> WorkerPoolMetrics {
        WorkerPoolMetrics {
            submitted: self.submitted,
            completed: self.completed,
            failed: self.failed,
            active_workers,
            idle_workers,
            queue_depth,
            average_duration_ms: self.average_duration_ms(),
        }
    }
}

/// Shared, lock-free worker-count gauges. Each worker flips `idle` on while
/// parked waiting for work and off while running a task.
#[derive(Default)]
pub(crate) struct WorkerGauges {
    pub(crate) active: AtomicUsize,
    pub(crate) idle: AtomicUsize,
}

impl WorkerGauges {
    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub(crate) fn idle(&self) -> usize {
        self.idle.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_duration_drops_samples_outside_the_window() {
        let mut inner = MetricsInner::new(3);
        for duration in [10, 20, 30, 100] {
            inner.record_completed(duration, false);
        }
        // window holds the last 3: 20, 30, 100
        assert!((inner.average_duration_ms() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_rate_is_zero_with_no_submissions() {
        let inner = MetricsInner::new(10);
        assert_eq!(inner.failure_rate(), 0.0);
    }
}
