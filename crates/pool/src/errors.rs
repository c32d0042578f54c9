use thiserror::Error;

/// Error kinds surfaced by the worker pool, per `spec.md` §7.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool was already initialized")]
    AlreadyInitialized,

    #[error("worker pool failed to start: {0}")]
    WorkerInitFailed(String),

    #[error("worker queue is at capacity")]
    QueueFull,

    #[error("worker pool is closed")]
    PoolClosed,

    #[error("worker died before replying")]
    WorkerDied,

    #[error("worker timed out")]
    WorkerTimedOut,
}
