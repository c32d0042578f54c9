//! Collaborator: a handful of [`ssr_registry::RouteDefinition`]s used as
//! workload shapes for the dispatcher and seeds for the benchmark harness,
//! grounded in `spec.md` §8's literal end-to-end scenarios.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use ssr_registry::{RegistryError, RenderError, RouteDefinition, RouteDefinitionBuilder, WorkloadKind};
use ssr_schema::RenderContext;

/// Registers the five mock routes against `builder`, in the order `spec.md`
/// §8 assumes (most specific path patterns first).
pub fn register_all(
    builder: ssr_registry::RouteRegistryBuilder,
) -> Result<ssr_registry::RouteRegistryBuilder, RegistryError> {
    builder
        .register(simple_route()?)?
        .register(api_echo_route()?)?
        .register(cpu_intensive_route()?)?
        .register(mixed_route()?)?
        .register(results_viewer_route()?)
}

/// `simple` — `^/test/simple$`, no fetcher, constant HTML body. The exact
/// body scenario 1 in `spec.md` §8 checks against.
pub fn simple_route() -> Result<RouteDefinition, RegistryError> {
    RouteDefinitionBuilder::new(
        "Simple",
        "^/test/simple$",
        Arc::new(|_data: &Value, _ctx: &RenderContext| {
            Ok("<!DOCTYPE html><html><body>ok</body></html>".to_string())
        }),
    )
    .workload(WorkloadKind::Simple)
    .build()
}

/// `api-echo` — `^/api/echo$`, an I/O-heavy route whose fetcher returns a
/// small JSON value and whose renderer echoes it back verbatim, per
/// scenario 4.
pub fn api_echo_route() -> Result<RouteDefinition, RegistryError> {
    RouteDefinitionBuilder::new(
        "ApiEcho",
        "^/api/echo$",
        Arc::new(|data: &Value, _ctx: &RenderContext| {
            serde_json::to_string(data).map_err(|err| RenderError::Failed(err.to_string()))
        }),
    )
    .fetcher(Arc::new(|_url, _ctx| Box::pin(async { Ok(json!({"ok": true})) })))
    .workload(WorkloadKind::IoHeavy)
    .build()
}

/// `cpu-intensive` — `^/test/cpu-intensive$`, no fetcher, a renderer that
/// spins a bounded CPU-bound loop before producing HTML, per scenario 5.
pub fn cpu_intensive_route() -> Result<RouteDefinition, RegistryError> {
    RouteDefinitionBuilder::new(
        "CpuIntensive",
        "^/test/cpu-intensive$",
        Arc::new(|_data: &Value, _ctx: &RenderContext| {
            let checksum = spin_cpu(200_000);
            Ok(format!(
                "<!DOCTYPE html><html><body>cpu {checksum}</body></html>"
            ))
        }),
    )
    .workload(WorkloadKind::CpuIntensive)
    .estimated_time_hint(Duration::from_millis(50))
    .build()
}

/// `mixed` — `^/test/mixed$`, fetcher sleeps briefly (simulated I/O) and the
/// renderer does bounded CPU work, carried over from the original "mixed"
/// example page.
pub fn mixed_route() -> Result<RouteDefinition, RegistryError> {
    RouteDefinitionBuilder::new(
        "Mixed",
        "^/test/mixed$",
        Arc::new(|data: &Value, _ctx: &RenderContext| {
            let checksum = spin_cpu(50_000);
            Ok(format!(
                "<!DOCTYPE html><html><body>mixed {data} {checksum}</body></html>"
            ))
        }),
    )
    .fetcher(Arc::new(|_url, _ctx| {
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(json!({"fetched": true}))
        })
    }))
    .workload(WorkloadKind::Mixed)
    .build()
}

/// `results-viewer` — `^/results$`, renders the most recent benchmark JSON
/// report under `./demos/results/` (if any) as an HTML table. The route the
/// hybrid classifier's CPU-intensive rule names as "the results-viewer page".
pub fn results_viewer_route() -> Result<RouteDefinition, RegistryError> {
    RouteDefinitionBuilder::new(
        "ResultsViewer",
        "^/results$",
        Arc::new(|_data: &Value, _ctx: &RenderContext| Ok(render_latest_report())),
    )
    .workload(WorkloadKind::CpuIntensive)
    .build()
}

fn spin_cpu(iterations: u32) -> u64 {
    let mut acc: u64 = 0;
    for i in 0..iterations {
        acc = acc.wrapping_add(u64::from(i)).wrapping_mul(2_654_435_761);
    }
    acc
}

fn render_latest_report() -> String {
    let dir = Path::new("./demos/results");
    let Some(report) = latest_report(dir) else {
        return "<!DOCTYPE html><html><body><p>no benchmark results yet</p></body></html>".to_string();
    };

    let rows = match report {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("<tr><td>{key}</td><td>{value}</td></tr>"))
            .collect::<Vec<_>>()
            .join(""),
        other => format!("<tr><td colspan=\"2\">{other}</td></tr>"),
    };

    format!("<!DOCTYPE html><html><body><table>{rows}</table></body></html>")
}

fn latest_report(dir: &Path) -> Option<Value> {
    let entries = fs::read_dir(dir).ok()?;
    let newest = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .max_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok())?;

    let content = fs::read_to_string(newest.path()).ok()?;
    serde_json::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_route_produces_the_scenario_one_body() {
        let route = simple_route().unwrap();
        let ctx = RenderContext {
            url: "http://localhost/test/simple".to_string(),
            method: ssr_schema::HttpMethod::Get,
            headers: Default::default(),
            body: None,
            locals: Default::default(),
        };
        let html = (route.renderer)(&Value::Null, &ctx).unwrap();
        assert_eq!(html, "<!DOCTYPE html><html><body>ok</body></html>");
    }

    #[tokio::test]
    async fn api_echo_fetcher_returns_the_scenario_four_payload() {
        let route = api_echo_route().unwrap();
        let ctx = RenderContext {
            url: "http://localhost/api/echo".to_string(),
            method: ssr_schema::HttpMethod::Get,
            headers: Default::default(),
            body: None,
            locals: Default::default(),
        };
        let data = (route.fetcher.unwrap())("/api/echo", &ctx).await.unwrap();
        let html = (route.renderer)(&data, &ctx).unwrap();
        assert_eq!(html, "{\"ok\":true}");
    }

    #[test]
    fn missing_report_directory_renders_placeholder() {
        let html = render_latest_report();
        assert!(html.contains("no benchmark results yet") || html.contains("<table>"));
    }

    #[test]
    fn register_all_registers_five_routes_in_order() {
        let registry = register_all(ssr_registry::RouteRegistryBuilder::new())
            .unwrap()
            .build();
        assert_eq!(registry.len(), 5);
        assert!(registry.by_name("Simple").is_some());
        assert!(registry.by_name("ResultsViewer").is_some());
    }
}
