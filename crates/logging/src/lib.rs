//! Thin wrapper over `tracing` so the rest of the workspace never names the
//! crate directly and logging can be compiled out entirely in release builds
//! that don't enable the relevant feature.

#[cfg(not(feature = "log_info"))]
#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {};
}

#[cfg(not(feature = "log_warnings"))]
#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {};
}

#[cfg(not(feature = "log_errors"))]
#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {};
}

#[cfg(not(feature = "log_debug"))]
#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {};
}

#[cfg(any(feature = "log_info", feature = "log_debug"))]
#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {
        tracing::info!($($t)*);
    };
}

#[cfg(any(feature = "log_warnings", feature = "log_debug"))]
#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {
        tracing::warn!($($t)*);
    };
}

#[cfg(feature = "log_debug")]
#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {
        tracing::debug!($($t)*);
    };
}

#[cfg(any(feature = "log_errors", feature = "log_debug"))]
#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {
        tracing::error!($($t)*);
    };
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn worker_lifecycle_messages_expand_without_arguments() {
        info!("worker pool shutting down");
        debug!("worker pool shutting down");
        warn!("worker pool below min_workers");
        error!("worker panicked while rendering");
    }

    #[test]
    #[traced_test]
    fn worker_lifecycle_messages_expand_with_format_arguments() {
        info!("spawning worker {}", 3);
        debug!("worker {} idle, ready to accept tasks", 3);
        warn!("data fetch failed for {} after {}ms", "/api/echo", 42);
        error!("worker {} panicked while rendering: {}", 3, "boom");
    }
}
