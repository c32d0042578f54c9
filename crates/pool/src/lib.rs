//! C5 — Worker Pool.
//!
//! Lifecycle-manages a set of OS-thread worker executors, transports
//! [`ssr_schema::RenderTask`]s to them over a bounded queue, and tracks
//! [`WorkerPoolMetrics`]. See `spec.md` §4.5 and §6 ("CPU detection").

mod cpu;
mod errors;
mod metrics;
mod pool;
mod worker;

pub use cpu::{detect_cpu_count, sizing};
pub use errors::PoolError;
pub use metrics::WorkerPoolMetrics;
pub use pool::{detect_sizing, WorkerPool};
pub use worker::WorkerState;
