use std::time::Instant;

use serde_json::Value;
use ssr_registry::RouteDefinition;
use ssr_schema::RenderContext;

use crate::errors::StageError;

/// The outcome of C3, always carrying how long the stage took — even on
/// failure — so the dispatcher can feed it into [`spec.md`] §3's
/// `RequestStats` regardless of success.
pub struct DataStageOutcome {
    pub result: Result<Value, StageError>,
    pub duration_ms: u64,
}

/// Executes `route`'s data fetcher on the caller's task, per `spec.md` §4.3.
/// A route without a fetcher returns `(null, 0)` immediately with no timing
/// cost. Any fetcher error is wrapped as [`StageError::DataFetchFailed`]
/// carrying the original message.
pub async fn fetch_data(route: &RouteDefinition, path: &str, ctx: &RenderContext) -> DataStageOutcome {
    let Some(fetcher) = route.fetcher.as_ref() else {
        return DataStageOutcome {
            result: Ok(Value::Null),
            duration_ms: 0,
        };
    };

    let started = Instant::now();
    let outcome = fetcher(path, ctx).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(value) => DataStageOutcome {
            result: Ok(value),
            duration_ms,
        },
        Err(err) => {
            ssr_logging::warn!("data fetch failed for {path} after {duration_ms}ms: {err}");
            DataStageOutcome {
                result: Err(StageError::DataFetchFailed(err.to_string())),
                duration_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssr_registry::RouteDefinitionBuilder;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn empty_ctx() -> RenderContext {
        RenderContext {
            url: "http://localhost/test".to_string(),
            method: ssr_schema::HttpMethod::Get,
            headers: HashMap::new(),
            body: None,
            locals: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn route_without_fetcher_returns_null_immediately() {
        let route = RouteDefinitionBuilder::new(
            "Simple",
            "^/test/simple$",
            Arc::new(|_d, _c| Ok("ok".to_string())),
        )
        .build()
        .unwrap();

        let outcome = fetch_data(&route, "/test/simple", &empty_ctx()).await;
        assert_eq!(outcome.result.unwrap(), Value::Null);
        assert_eq!(outcome.duration_ms, 0);
    }

    #[tokio::test]
    async fn fetcher_error_is_wrapped_as_data_fetch_failed() {
        let route = RouteDefinitionBuilder::new(
            "Broken",
            "^/broken$",
            Arc::new(|_d, _c| Ok("ok".to_string())),
        )
        .fetcher(Arc::new(|_url, _ctx| {
            Box::pin(async { Err(ssr_registry::DataFetchError::Failed("upstream down".into())) })
        }))
        .build()
        .unwrap();

        let outcome = fetch_data(&route, "/broken", &empty_ctx()).await;
        match outcome.result {
            Err(StageError::DataFetchFailed(msg)) => assert!(msg.contains("upstream down")),
            other => panic!("expected DataFetchFailed, got {other:?}"),
        }
    }
}
