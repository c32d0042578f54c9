use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The minimal value-only payload crossed from a worker back to the main
/// tier, per `spec.md` §3 "RenderOutput".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
    pub worker_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderOutput {
    #[must_use]
    pub fn ok(body: String, duration_ms: u64, worker_id: u32) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            headers: HashMap::new(),
            body,
            duration_ms,
            worker_id,
            error: None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_constructor_has_no_error() {
        let output = RenderOutput::ok("<html></html>".to_string(), 3, 1);
        assert_eq!(output.status, 200);
        assert!(!output.is_error());
    }
}
