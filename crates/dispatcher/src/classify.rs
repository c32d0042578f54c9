use ssr_config::DispatchMode;

use crate::stats::RequestStats;

/// Where a request's render stage will run. `worker_id` is meaningless for
/// [`ExecutionPath::Inline`]; [`ssr_schema::RenderOutput::worker_id`] is `0`
/// on that path by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Inline,
    Worker,
}

const METRICS_SUFFIX: &str = "/api/metrics";

/// Chooses inline vs. worker execution for `path` under `mode`, per
/// `spec.md` §4.6. A pure function of `(mode, path, stats)` — calling it
/// twice with the same stats snapshot always yields the same answer.
#[must_use]
pub fn classify(mode: DispatchMode, path: &str, stats: &RequestStats) -> ExecutionPath {
    match mode {
        DispatchMode::Traditional => ExecutionPath::Inline,
        DispatchMode::Worker => {
            if path.ends_with(METRICS_SUFFIX) {
                ExecutionPath::Inline
            } else {
                ExecutionPath::Worker
            }
        }
        DispatchMode::Hybrid => classify_hybrid(path, stats),
    }
}

fn classify_hybrid(path: &str, stats: &RequestStats) -> ExecutionPath {
    if path.ends_with(METRICS_SUFFIX) {
        return ExecutionPath::Inline;
    }

    if path.starts_with("/api") || path.contains("api-heavy") || path.contains("mixed") {
        return ExecutionPath::Inline;
    }

    if path.contains("cpu-intensive") || path.contains("results") {
        return ExecutionPath::Worker;
    }

    if path == "/" || path.contains("simple") {
        return ExecutionPath::Worker;
    }

    match stats.average_ms(path) {
        None => ExecutionPath::Worker,
        Some(average) if average < 50.0 => ExecutionPath::Inline,
        Some(average) if average > 200.0 => ExecutionPath::Inline,
        Some(_) => ExecutionPath::Worker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traditional_mode_is_always_inline() {
        let stats = RequestStats::new(100);
        assert_eq!(classify(DispatchMode::Traditional, "/test/cpu-intensive", &stats), ExecutionPath::Inline);
    }

    #[test]
    fn worker_mode_sends_metrics_endpoint_inline_but_everything_else_to_workers() {
        let stats = RequestStats::new(100);
        assert_eq!(classify(DispatchMode::Worker, "/api/metrics", &stats), ExecutionPath::Inline);
        assert_eq!(classify(DispatchMode::Worker, "/test/simple", &stats), ExecutionPath::Worker);
    }

    #[test]
    fn hybrid_sends_api_paths_inline() {
        let stats = RequestStats::new(100);
        assert_eq!(classify(DispatchMode::Hybrid, "/api/echo", &stats), ExecutionPath::Inline);
    }

    #[test]
    fn hybrid_sends_cpu_intensive_to_worker() {
        let stats = RequestStats::new(100);
        assert_eq!(classify(DispatchMode::Hybrid, "/test/cpu-intensive", &stats), ExecutionPath::Worker);
    }

    #[test]
    fn hybrid_sends_simple_routes_to_worker() {
        let stats = RequestStats::new(100);
        assert_eq!(classify(DispatchMode::Hybrid, "/test/simple", &stats), ExecutionPath::Worker);
        assert_eq!(classify(DispatchMode::Hybrid, "/", &stats), ExecutionPath::Worker);
    }

    #[test]
    fn hybrid_falls_back_to_stats_for_unrecognized_paths() {
        let mut stats = RequestStats::new(100);
        assert_eq!(classify(DispatchMode::Hybrid, "/custom", &stats), ExecutionPath::Worker);

        stats.record("/custom", 10);
        assert_eq!(classify(DispatchMode::Hybrid, "/custom", &stats), ExecutionPath::Inline);

        stats.record("/custom", 500);
        stats.record("/custom", 500);
        assert_eq!(classify(DispatchMode::Hybrid, "/custom", &stats), ExecutionPath::Inline);
    }

    #[test]
    fn classification_is_stable_given_fixed_stats() {
        let stats = RequestStats::new(100);
        let first = classify(DispatchMode::Hybrid, "/custom", &stats);
        let second = classify(DispatchMode::Hybrid, "/custom", &stats);
        assert_eq!(first, second);
    }
}
