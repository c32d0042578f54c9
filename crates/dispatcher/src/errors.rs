use thiserror::Error;

/// Error kinds the dispatcher distinguishes internally before mapping each
/// to a status code and HTML body, per `spec.md` §7.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches the requested path")]
    NotFound,

    #[error("request malformed: {0}")]
    MalformedRequest(String),

    #[error("request body already consumed")]
    BodyConsumed,

    #[error("data fetch failed: {0}")]
    DataFetchFailed(String),

    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MalformedRequest(_) | Self::BodyConsumed => 400,
            Self::DataFetchFailed(_) | Self::WorkerPool(_) => 500,
        }
    }
}
