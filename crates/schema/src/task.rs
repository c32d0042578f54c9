use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SchemaError;
use crate::method::HttpMethod;
use crate::request::{IncomingRequest, RequestBody};

/// The minimal value-only payload crossed from the main tier to a worker, per
/// `spec.md` §3 "RenderTask". Every field here must survive a deep structural
/// copy: no ownership handles, no capability references, no mutable
/// back-pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderTask {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub route_name: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    pub locals: HashMap<String, Value>,
}

/// Everything a worker needs to run the render stage, reconstructed from a
/// [`RenderTask`] on the receiving side.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub locals: HashMap<String, Value>,
}

impl RenderContext {
    /// Builds a context directly from the incoming request, for use by C3
    /// (the data fetcher needs headers/method/locals but not yet the data it
    /// is about to produce). [`RenderTask::reconstruct`] builds the
    /// equivalent context on the worker side, after the data is known.
    #[must_use]
    pub fn from_request(request: &IncomingRequest, locals: HashMap<String, Value>) -> Self {
        let body = match &request.body {
            RequestBody::None | RequestBody::Consumed => None,
            RequestBody::Buffered(bytes) => Some(bytes.clone()),
        };

        Self {
            url: request.url.clone(),
            method: request.method.clone(),
            headers: request.headers.clone(),
            body,
            locals,
        }
    }
}

impl RenderTask {
    /// Extracts url/method/headers/body from `request` and combines them with
    /// the route identity and pre-fetched `data` produced upstream by the
    /// registry (C2) and data stage (C3). Fails with [`SchemaError::MalformedRequest`]
    /// if the url isn't absolute-parseable, and [`SchemaError::BodyConsumed`]
    /// if the caller already read a streaming body out from under us.
    pub fn assemble(
        request: &IncomingRequest,
        route_name: impl Into<String>,
        data: Value,
        locals: HashMap<String, Value>,
    ) -> Result<Self, SchemaError> {
        if !is_absolute_url(&request.url) {
            return Err(SchemaError::MalformedRequest(request.url.clone()));
        }

        let body = match &request.body {
            RequestBody::None => None,
            RequestBody::Buffered(bytes) => Some(bytes.clone()),
            RequestBody::Consumed => return Err(SchemaError::BodyConsumed),
        };

        Ok(Self {
            url: request.url.clone(),
            method: request.method.clone(),
            headers: request.headers.clone(),
            route_name: route_name.into(),
            data,
            body,
            locals,
        })
    }

    /// Reconstructs the request-shaped input a worker's render stage needs,
    /// discarding nothing except the route identity (the worker already has
    /// that as the dispatch key).
    #[must_use]
    pub fn reconstruct(&self) -> RenderContext {
        RenderContext {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            locals: self.locals.clone(),
        }
    }
}

fn is_absolute_url(raw: &str) -> bool {
    match raw.find("://") {
        Some(idx) if idx > 0 => {
            let scheme = &raw[..idx];
            !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
                && raw.len() > idx + 3
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> IncomingRequest {
        IncomingRequest::new("http://localhost:4321/test/simple", HttpMethod::Get)
    }

    #[test]
    fn assemble_succeeds_for_absolute_url() {
        let task = RenderTask::assemble(
            &sample_request(),
            "Simple",
            Value::Null,
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(task.route_name, "Simple");
        assert_eq!(task.method, HttpMethod::Get);
    }

    #[test]
    fn assemble_rejects_relative_url() {
        let request = IncomingRequest::new("/test/simple", HttpMethod::Get);
        let err = RenderTask::assemble(&request, "Simple", Value::Null, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, SchemaError::MalformedRequest(_)));
    }

    #[test]
    fn assemble_rejects_consumed_body() {
        let mut request = sample_request();
        request.body = RequestBody::Consumed;
        let err = RenderTask::assemble(&request, "Simple", Value::Null, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, SchemaError::BodyConsumed));
    }

    #[test]
    fn reconstruct_preserves_body_and_locals() {
        let request = sample_request().with_body(b"hello".to_vec());
        let mut locals = HashMap::new();
        locals.insert("trace_id".to_string(), Value::String("abc".into()));

        let task = RenderTask::assemble(&request, "Simple", Value::Null, locals).unwrap();
        let ctx = task.reconstruct();
        assert_eq!(ctx.body, Some(b"hello".to_vec()));
        assert_eq!(ctx.locals.get("trace_id").unwrap(), "abc");
    }
}
