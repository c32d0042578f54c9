use std::fs;

/// Detects the usable logical CPU count, per `spec.md` §6 "CPU detection":
/// try a cgroup v2 quota, then cgroup v1, then fall back to the OS-reported
/// count. The caller applies any `WORKER_THREADS` override on top of this —
/// detection never looks at the environment itself.
#[must_use]
pub fn detect_cpu_count() -> usize {
    cgroup_v2_quota()
        .or_else(cgroup_v1_quota)
        .unwrap_or_else(os_reported_count)
}

fn cgroup_v2_quota() -> Option<usize> {
    let raw = fs::read_to_string("/sys/fs/cgroup/cpu.max").ok()?;
    let mut parts = raw.split_whitespace();
    let max = parts.next()?;
    let period = parts.next()?.parse::<f64>().ok()?;
    if max == "max" {
        return None;
    }
    let quota = max.parse::<f64>().ok()?;
    if quota < 0.0 || period <= 0.0 {
        return None;
    }
    positive_ceil(quota / period)
}

fn cgroup_v1_quota() -> Option<usize> {
    let quota = fs::read_to_string("/sys/fs/cgroup/cpu/cpu.cfs_quota_us")
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()?;
    let period = fs::read_to_string("/sys/fs/cgroup/cpu/cpu.cfs_period_us")
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()?;
    if quota < 0.0 || period <= 0.0 {
        return None;
    }
    positive_ceil(quota / period)
}

fn positive_ceil(value: f64) -> Option<usize> {
    let rounded = value.ceil();
    if rounded >= 1.0 {
        Some(rounded as usize)
    } else {
        None
    }
}

fn os_reported_count() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// Sizing policy from `spec.md` §4.5: `minWorkers = max(1, floor(cpu/2))`,
/// `maxWorkers = max(2, cpu)`.
#[must_use]
pub fn sizing(cpu: usize) -> (usize, usize) {
    let min_workers = usize::max(1, cpu / 2);
    let max_workers = usize::max(2, cpu);
    (min_workers, max_workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_matches_spec_formula() {
        assert_eq!(sizing(1), (1, 2));
        assert_eq!(sizing(4), (2, 4));
        assert_eq!(sizing(8), (4, 8));
        assert_eq!(sizing(0), (1, 2));
    }

    #[test]
    fn os_reported_count_is_never_zero() {
        assert!(os_reported_count() >= 1);
    }
}
