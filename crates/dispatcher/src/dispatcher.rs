use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ssr_config::DispatchMode;
use ssr_pool::{PoolError, WorkerPool};
use ssr_registry::RouteRegistry;
use ssr_schema::{IncomingRequest, RenderContext, RenderOutput, RenderTask};

use crate::classify::{classify, ExecutionPath};
use crate::errors::DispatchError;
use crate::stats::RequestStats;

/// C6 — the per-request entry point. Matches a route, runs the data stage,
/// picks inline or worker execution, and assembles the final reply, per
/// `spec.md` §4.6.
pub struct Dispatcher {
    registry: Arc<RouteRegistry>,
    pool: Arc<WorkerPool>,
    mode: DispatchMode,
    debug: bool,
    stats: Mutex<RequestStats>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<RouteRegistry>, pool: Arc<WorkerPool>, mode: DispatchMode, debug: bool, stats_cap: usize) -> Self {
        Self {
            registry,
            pool,
            mode,
            debug,
            stats: Mutex::new(RequestStats::new(stats_cap)),
        }
    }

    /// Handles one request end to end. Always returns a complete
    /// [`RenderOutput`] — errors are mapped to synthetic HTML pages rather
    /// than propagated, matching the "no partial responses" invariant in
    /// `spec.md` §7.
    pub async fn dispatch(&self, request: &IncomingRequest) -> RenderOutput {
        let path = request.path().to_string();

        let Some((route, _params)) = self.registry.match_path(&path) else {
            return error_output(&DispatchError::NotFound);
        };
        let route = route.clone();

        let ctx = RenderContext::from_request(request, HashMap::new());

        let data_outcome = ssr_stages::fetch_data(&route, &path, &ctx).await;
        let data = match data_outcome.result {
            Ok(data) => data,
            Err(err) => return error_output(&DispatchError::DataFetchFailed(err.to_string())),
        };

        let task = match RenderTask::assemble(request, route.name.clone(), data.clone(), HashMap::new()) {
            Ok(task) => task,
            Err(ssr_schema::SchemaError::MalformedRequest(url)) => {
                return error_output(&DispatchError::MalformedRequest(url))
            }
            Err(ssr_schema::SchemaError::BodyConsumed) => return error_output(&DispatchError::BodyConsumed),
        };

        let execution_path = {
            let stats = self.stats.lock().unwrap();
            classify(self.mode, &path, &stats)
        };

        if self.debug {
            ssr_logging::debug!("mode decision: path={path} mode={} execution={execution_path:?}", self.mode);
        }

        let output = match execution_path {
            ExecutionPath::Inline => self.render_inline(&route, &data, &ctx),
            ExecutionPath::Worker => match self.submit_to_pool(task) {
                Ok(output) => output,
                Err(PoolError::QueueFull) => {
                    if self.debug {
                        ssr_logging::debug!("queue full, falling back to inline for {path}");
                    }
                    self.render_inline(&route, &data, &ctx)
                }
                Err(PoolError::PoolClosed) => RenderOutput {
                    status: 503,
                    reason: "Service Unavailable".to_string(),
                    headers: HashMap::new(),
                    body: not_found_page("the service is shutting down"),
                    duration_ms: 0,
                    worker_id: 0,
                    error: Some("pool closed".to_string()),
                },
                Err(other) => error_output(&DispatchError::WorkerPool(other.to_string())),
            },
        };

        self.stats.lock().unwrap().record(&path, output.duration_ms);
        output
    }

    fn render_inline(&self, route: &ssr_registry::RouteDefinition, data: &serde_json::Value, ctx: &RenderContext) -> RenderOutput {
        let outcome = ssr_stages::render(route, data, ctx);
        if let Some(error) = outcome.error {
            RenderOutput {
                status: 500,
                reason: "Internal Server Error".to_string(),
                headers: HashMap::new(),
                body: outcome.html,
                duration_ms: outcome.duration_ms,
                worker_id: 0,
                error: Some(error.to_string()),
            }
        } else {
            RenderOutput::ok(outcome.html, outcome.duration_ms, 0)
        }
    }

    fn submit_to_pool(&self, task: RenderTask) -> Result<RenderOutput, PoolError> {
        let pool = Arc::clone(&self.pool);
        let started = Instant::now();
        let result = tokio::task::block_in_place(move || pool.submit(task));
        if self.debug {
            ssr_logging::debug!("worker submit took {:?}", started.elapsed());
        }
        result
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }
}

fn error_output(error: &DispatchError) -> RenderOutput {
    RenderOutput {
        status: error.status(),
        reason: reason_phrase(error.status()).to_string(),
        headers: HashMap::new(),
        body: match error {
            DispatchError::NotFound => not_found_page("no route matches this path"),
            other => not_found_page(&other.to_string()),
        },
        duration_ms: 0,
        worker_id: 0,
        error: Some(error.to_string()),
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

fn not_found_page(message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Error</title></head><body><p>{}</p></body></html>",
        escape_html(message)
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
