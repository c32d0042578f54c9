//! Concurrent HTTP load generator: fires a configurable number of concurrent
//! requests at a running `ssr-server` instance, computes throughput and
//! latency percentiles, and writes a timestamped JSON report. Schema of that
//! report file is explicitly irrelevant to the core, per `spec.md` §6
//! ("Persisted state").

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Load generator for the SSR dispatcher")]
struct Args {
    /// Full URL to hit, e.g. http://localhost:4321/test/simple
    #[arg(long, default_value = "http://localhost:4321/test/simple")]
    url: String,

    /// Number of requests fired concurrently at a time.
    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Total number of requests to issue.
    #[arg(long, default_value_t = 100)]
    requests: usize,

    /// Label recorded in the report, e.g. the dispatch mode under test.
    #[arg(long, default_value = "unlabeled")]
    label: String,

    /// Directory the JSON report is written to.
    #[arg(long, default_value = "./demos/results")]
    out_dir: PathBuf,
}

struct SampleResult {
    status: u16,
    latency_ms: f64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let client = Arc::new(reqwest::Client::new());

    let server_info = fetch_server_info(&client, &args.url).await;

    let started = Instant::now();
    let mut samples = Vec::with_capacity(args.requests);
    let mut remaining = args.requests;

    while remaining > 0 {
        let batch_size = remaining.min(args.concurrency);
        let mut handles = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let client = Arc::clone(&client);
            let url = args.url.clone();
            handles.push(tokio::spawn(async move { fire_one(&client, &url).await }));
        }
        for handle in handles {
            if let Ok(sample) = handle.await {
                samples.push(sample);
            }
        }
        remaining -= batch_size;
    }

    let total_elapsed = started.elapsed();
    let report = build_report(&args, &samples, total_elapsed, server_info);
    write_report(&args.out_dir, &report);
    println!("{}", serde_json::to_string_pretty(&report).unwrap());
}

async fn fetch_server_info(client: &reqwest::Client, target_url: &str) -> serde_json::Value {
    // scheme://host[:port] is the first three '/'-delimited segments.
    let base = target_url
        .splitn(4, '/')
        .take(3)
        .collect::<Vec<_>>()
        .join("/");
    let info_url = format!("{base}/api/server-info");
    client
        .get(info_url)
        .send()
        .await
        .ok()
        .map(|_| serde_json::json!({"reachable": true}))
        .unwrap_or(serde_json::json!({"reachable": false}))
}

async fn fire_one(client: &reqwest::Client, url: &str) -> SampleResult {
    let started = Instant::now();
    match client.get(url).send().await {
        Ok(response) => SampleResult {
            status: response.status().as_u16(),
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        },
        Err(_) => SampleResult {
            status: 0,
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        },
    }
}

fn build_report(
    args: &Args,
    samples: &[SampleResult],
    total_elapsed: std::time::Duration,
    server_info: serde_json::Value,
) -> serde_json::Value {
    let mut latencies: Vec<f64> = samples.iter().map(|s| s.latency_ms).collect();
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let success_count = samples.iter().filter(|s| (200..400).contains(&s.status)).count();
    let throughput = samples.len() as f64 / total_elapsed.as_secs_f64().max(f64::EPSILON);

    serde_json::json!({
        "label": args.label,
        "url": args.url,
        "requested": args.requests,
        "completed": samples.len(),
        "succeeded": success_count,
        "concurrency": args.concurrency,
        "total_ms": total_elapsed.as_secs_f64() * 1000.0,
        "throughput_rps": throughput,
        "latency_ms": {
            "p50": percentile(&latencies, 0.50),
            "p95": percentile(&latencies, 0.95),
            "p99": percentile(&latencies, 0.99),
        },
        "server_info": server_info,
        "timestamp_unix": SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0),
    })
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn write_report(out_dir: &PathBuf, report: &serde_json::Value) {
    if std::fs::create_dir_all(out_dir).is_err() {
        eprintln!("warning: could not create {}", out_dir.display());
        return;
    }
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let path = out_dir.join(format!("bench-{timestamp}.json"));
    if let Err(err) = std::fs::write(&path, serde_json::to_vec_pretty(report).unwrap()) {
        eprintln!("warning: failed to write report to {}: {err}", path.display());
    }
}
