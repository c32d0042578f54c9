use std::time::Instant;

use serde_json::Value;
use ssr_registry::RouteDefinition;
use ssr_schema::RenderContext;

use crate::errors::StageError;

/// The outcome of C4. `html` is always present — on renderer failure it holds
/// a self-contained synthetic 500 document rather than an empty string, so
/// callers never need a second branch to produce a response body.
pub struct RenderStageOutcome {
    pub html: String,
    pub duration_ms: u64,
    pub error: Option<StageError>,
}

/// Runs `route`'s renderer against `data` and `ctx`, per `spec.md` §4.4. The
/// renderer is a plain synchronous function: no I/O, no async runtime
/// assumed, so it must behave identically whether called here inline or from
/// inside a worker thread.
///
/// On failure the synthesized error document HTML-escapes the error message
/// so the page always parses as valid HTML, even when the message itself
/// contains HTML-reserved characters.
#[must_use]
pub fn render(route: &RouteDefinition, data: &Value, ctx: &RenderContext) -> RenderStageOutcome {
    let started = Instant::now();
    let outcome = (route.renderer)(data, ctx);
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(html) => RenderStageOutcome {
            html,
            duration_ms,
            error: None,
        },
        Err(err) => {
            let stage_error = StageError::RenderFailed(err.to_string());
            ssr_logging::warn!("render failed for route '{}': {stage_error}", route.name);
            RenderStageOutcome {
                html: synthesize_error_page(&stage_error),
                duration_ms,
                error: Some(stage_error),
            }
        }
    }
}

fn synthesize_error_page(error: &StageError) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>500 Internal Server Error</title></head>\
         <body><h1>500 Internal Server Error</h1><p>{}</p></body></html>",
        escape_html(&error.to_string())
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
