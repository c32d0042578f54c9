use std::fmt;

/// Dispatch mode read from `SSR_MODE`. Unknown values fall back to the default
/// rather than failing process startup, per `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Traditional,
    Worker,
    Hybrid,
}

impl DispatchMode {
    #[must_use]
    pub fn from_env_str(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "worker" => Self::Worker,
            "hybrid" => Self::Hybrid,
            "traditional" => Self::Traditional,
            _ => Self::default(),
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Traditional => "traditional",
            Self::Worker => "worker",
            Self::Hybrid => "hybrid",
        };
        write!(f, "{name}")
    }
}
