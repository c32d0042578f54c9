//! The HTTP boundary: owns the listener, turns incoming requests into
//! [`ssr_schema::IncomingRequest`]s for the dispatcher, and exposes the
//! `/api/metrics` and `/api/server-info` introspection endpoints named in
//! `spec.md` §6.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use ssr_config::{PoolTuning, ProcessConfig};
use ssr_dispatcher::Dispatcher;
use ssr_pool::WorkerPool;
use ssr_registry::RouteRegistryBuilder;
use ssr_schema::{HttpMethod, IncomingRequest, RequestBody};
use tower_http::services::ServeDir;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const SHUTDOWN_HARD_TIMEOUT: Duration = Duration::from_secs(10);

struct AppState {
    dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ProcessConfig::from_env();
    let tuning = PoolTuning::load_or_default("ssr.toml");

    let registry = ssr_mock_routes::register_all(RouteRegistryBuilder::new())
        .expect("mock route registration must not collide")
        .build();
    let registry = Arc::new(registry);

    let (min_workers, max_workers) = ssr_pool::detect_sizing(config.worker_threads_override);
    let pool = Arc::new(WorkerPool::new(
        Arc::clone(&registry),
        min_workers,
        max_workers,
        tuning.idle_timeout(),
        tuning.queue_multiplier,
        tuning.rolling_window,
    ));
    pool.initialize().expect("worker pool must initialize at startup");

    ssr_logging::info!(
        "ssr dispatcher starting: mode={} min_workers={min_workers} max_workers={max_workers}",
        config.mode
    );

    let dispatcher = Dispatcher::new(registry, Arc::clone(&pool), config.mode, config.debug, tuning.stats_cap);
    let state = Arc::new(AppState { dispatcher });

    let app = Router::new()
        .route("/api/metrics", get(metrics_handler))
        .route("/api/server-info", get(server_info_handler))
        .nest_service("/static", ServeDir::new("./demos/static"))
        .fallback(dispatch_handler)
        .with_state(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind listener");
    ssr_logging::info!("listening on {addr}");

    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    match tokio::time::timeout(SHUTDOWN_HARD_TIMEOUT + Duration::from_secs(5), serve).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => ssr_logging::error!("server exited with error: {err}"),
        Err(_) => ssr_logging::error!("graceful shutdown exceeded the hard timeout, forcing exit"),
    }

    let pool_for_shutdown = Arc::clone(&pool);
    let shutdown = tokio::task::spawn_blocking(move || pool_for_shutdown.shutdown());
    if tokio::time::timeout(SHUTDOWN_HARD_TIMEOUT, shutdown).await.is_err() {
        ssr_logging::error!("worker pool shutdown exceeded the hard timeout, forcing exit");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn dispatch_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let incoming = match to_incoming_request(request).await {
        Ok(incoming) => incoming,
        Err(response) => return response,
    };

    let output = state.dispatcher.dispatch(&incoming).await;
    render_output_to_response(output)
}

async fn to_incoming_request(request: Request) -> Result<IncomingRequest, Response> {
    let host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost")
        .to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let method = HttpMethod::from(request.method());
    let url = format!("http://{host}{path_and_query}");

    let mut headers = HashMap::new();
    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let body_bearing = method.is_body_bearing();
    let body = if body_bearing {
        match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
            Ok(bytes) if bytes.is_empty() => RequestBody::None,
            Ok(bytes) => RequestBody::Buffered(bytes.to_vec()),
            Err(_) => return Err((StatusCode::BAD_REQUEST, "failed to read request body").into_response()),
        }
    } else {
        RequestBody::None
    };

    Ok(IncomingRequest {
        url,
        method,
        headers,
        body,
    })
}

fn render_output_to_response(output: ssr_schema::RenderOutput) -> Response {
    let status = StatusCode::from_u16(output.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    for (name, value) in &output.headers {
        if let (Ok(name), Ok(value)) = (
            axum::http::HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    if !headers.contains_key(axum::http::header::CONTENT_TYPE) {
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }

    (status, headers, output.body).into_response()
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let pool = state.dispatcher.pool();
    let metrics = pool.metrics();
    let success_rate = if metrics.submitted == 0 {
        100.0
    } else {
        100.0 * (metrics.submitted - metrics.failed) as f64 / metrics.submitted as f64
    };

    let body = serde_json::json!({
        "mode": state.dispatcher.mode().to_string(),
        "pool_initialized": true,
        "threads": {
            "active": pool.active_workers(),
            "min": pool.min_workers(),
            "max": pool.max_workers(),
        },
        "queue_size": metrics.queue_depth,
        "completed": metrics.completed,
        "metrics": {
            "submitted": metrics.submitted,
            "completed": metrics.completed,
            "failed": metrics.failed,
            "success_rate_pct": success_rate,
            "failure_rate_pct": 100.0 - success_rate,
            "average_duration_ms": metrics.average_duration_ms,
        },
    });

    let mut response = (StatusCode::OK, axum::Json(body)).into_response();
    response
        .headers_mut()
        .insert(axum::http::header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

async fn server_info_handler(State(state): State<Arc<AppState>>) -> Response {
    let pool = state.dispatcher.pool();
    let body = serde_json::json!({
        "mode": state.dispatcher.mode().to_string(),
        "hostname": std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        "pid": std::process::id(),
        "worker_threads": {
            "min": pool.min_workers(),
            "max": pool.max_workers(),
        },
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}
