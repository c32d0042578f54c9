use std::env;

use crate::mode::DispatchMode;

/// Startup configuration read once from the environment, per `spec.md` §6.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub mode: DispatchMode,
    pub debug: bool,
    pub port: u16,
    pub host: String,
    pub worker_threads_override: Option<usize>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            debug: false,
            port: 4321,
            host: "0.0.0.0".to_string(),
            worker_threads_override: None,
        }
    }
}

impl ProcessConfig {
    /// Reads `SSR_MODE`, `SSR_DEBUG`, `PORT`, `HOST` and `WORKER_THREADS`.
    /// Unknown or malformed values fall back to their default silently, since
    /// the core has no "fail process startup on bad env" requirement.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mode = env::var("SSR_MODE")
            .map(|raw| DispatchMode::from_env_str(&raw))
            .unwrap_or(defaults.mode);

        let debug = env::var("SSR_DEBUG")
            .map(|raw| raw.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.debug);

        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let host = env::var("HOST").unwrap_or(defaults.host);

        let worker_threads_override = env::var("WORKER_THREADS")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);

        Self {
            mode,
            debug,
            port,
            host,
            worker_threads_override,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // `std::env` is process-global; serialize the env-mutating tests so they
    // don't clobber each other when run concurrently.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_when_env_is_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in ["SSR_MODE", "SSR_DEBUG", "PORT", "HOST", "WORKER_THREADS"] {
            env::remove_var(key);
        }
        let cfg = ProcessConfig::from_env();
        assert_eq!(cfg.mode, DispatchMode::Traditional);
        assert!(!cfg.debug);
        assert_eq!(cfg.port, 4321);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.worker_threads_override, None);
    }

    #[test]
    fn malformed_port_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("PORT", "not-a-port");
        let cfg = ProcessConfig::from_env();
        assert_eq!(cfg.port, 4321);
        env::remove_var("PORT");
    }

    #[test]
    fn zero_worker_threads_is_treated_as_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("WORKER_THREADS", "0");
        let cfg = ProcessConfig::from_env();
        assert_eq!(cfg.worker_threads_override, None);
        env::remove_var("WORKER_THREADS");
    }
}
