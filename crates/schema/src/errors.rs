use thiserror::Error;

/// Errors raised while assembling or reconstructing the value-only request
/// schema, per `spec.md` §4.1.
#[derive(Debug, Error, Clone)]
pub enum SchemaError {
    #[error("request url is not absolute-parseable: {0}")]
    MalformedRequest(String),

    #[error("request body was already consumed by a previous read")]
    BodyConsumed,
}
