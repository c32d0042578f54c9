use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use ssr_schema::RenderContext;

use crate::errors::{DataFetchError, RegistryError, RenderError};
use crate::workload::WorkloadKind;

/// A renderer is a pure function from pre-fetched data to a complete HTML
/// document — no I/O permitted, per `spec.md` §4.4. It must run unmodified
/// whether invoked inline on the caller's task or inside a worker thread, so
/// it is a plain synchronous `Fn`.
pub type Renderer =
    Arc<dyn Fn(&Value, &RenderContext) -> Result<String, RenderError> + Send + Sync>;

pub type BoxFetchFuture = Pin<Box<dyn Future<Output = Result<Value, DataFetchError>> + Send>>;

/// A data fetcher performs I/O on the caller's task to produce a renderer's
/// input, per `spec.md` §4.3. It always runs on the main tier, never inside a
/// worker, so it is free to be async.
pub type DataFetcher = Arc<dyn Fn(&str, &RenderContext) -> BoxFetchFuture + Send + Sync>;

#[derive(Clone)]
pub struct RouteDefinition {
    pub name: String,
    pub pattern: Regex,
    pub renderer: Renderer,
    pub fetcher: Option<DataFetcher>,
    pub workload: Option<WorkloadKind>,
    pub estimated_time_hint: Option<Duration>,
}

impl std::fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("has_fetcher", &self.fetcher.is_some())
            .field("workload", &self.workload)
            .finish()
    }
}

pub struct RouteDefinitionBuilder {
    name: String,
    pattern: String,
    renderer: Renderer,
    fetcher: Option<DataFetcher>,
    workload: Option<WorkloadKind>,
    estimated_time_hint: Option<Duration>,
}

impl RouteDefinitionBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, renderer: Renderer) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            renderer,
            fetcher: None,
            workload: None,
            estimated_time_hint: None,
        }
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: DataFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn workload(mut self, workload: WorkloadKind) -> Self {
        self.workload = Some(workload);
        self
    }

    #[must_use]
    pub fn estimated_time_hint(mut self, hint: Duration) -> Self {
        self.estimated_time_hint = Some(hint);
        self
    }

    pub fn build(self) -> Result<RouteDefinition, RegistryError> {
        let pattern = Regex::new(&self.pattern)
            .map_err(|err| RegistryError::InvalidPattern(self.pattern.clone(), err))?;

        Ok(RouteDefinition {
            name: self.name,
            pattern,
            renderer: self.renderer,
            fetcher: self.fetcher,
            workload: self.workload,
            estimated_time_hint: self.estimated_time_hint,
        })
    }
}
