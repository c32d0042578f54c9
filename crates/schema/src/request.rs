use std::collections::HashMap;

use crate::method::HttpMethod;

/// State of a request body as observed by the HTTP boundary before it hands
/// the request to the dispatcher. `Consumed` models a caller who already read
/// a streaming body out from under us — [`crate::RenderTask::assemble`] turns
/// that into [`crate::SchemaError::BodyConsumed`] rather than silently
/// dropping the body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    None,
    Buffered(Vec<u8>),
    Consumed,
}

/// The request shape handed to the dispatcher by the (external) HTTP
/// boundary, already parsed into method/url/headers/body per `spec.md` §1's
/// "does not interpret HTTP semantics beyond method, URL, headers, and body
/// bytes".
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
}

impl IncomingRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            body: RequestBody::None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Buffered(body);
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        // Strip scheme://authority if present, falling back to the raw url
        // for already-relative inputs used directly by tests.
        match self.url.find("://") {
            Some(idx) => {
                let after_scheme = &self.url[idx + 3..];
                match after_scheme.find('/') {
                    Some(slash) => &after_scheme[slash..],
                    None => "/",
                }
            }
            None => &self.url,
        }
    }
}
