use thiserror::Error;

/// Errors surfaced by the data and render stages, per `spec.md` §7.
#[derive(Debug, Error, Clone)]
pub enum StageError {
    #[error("data fetch failed: {0}")]
    DataFetchFailed(String),

    #[error("render failed: {0}")]
    RenderFailed(String),
}
