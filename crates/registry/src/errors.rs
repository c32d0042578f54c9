use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route pattern '{0}' failed to compile: {1}")]
    InvalidPattern(String, regex::Error),

    #[error("route name '{0}' is already registered")]
    DuplicateName(String),
}

#[derive(Debug, Error, Clone)]
pub enum DataFetchError {
    #[error("data fetch failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error, Clone)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),
}
