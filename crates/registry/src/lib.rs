//! C2 — Route Registry.
//!
//! An ordered sequence of [`RouteDefinition`]s, frozen after
//! [`RouteRegistryBuilder::build`]. See `spec.md` §4.2.

mod errors;
mod registry;
mod route;
mod workload;

pub use errors::{DataFetchError, RegistryError, RenderError};
pub use registry::{RouteRegistry, RouteRegistryBuilder};
pub use route::{BoxFetchFuture, DataFetcher, Renderer, RouteDefinition, RouteDefinitionBuilder};
pub use workload::WorkloadKind;
