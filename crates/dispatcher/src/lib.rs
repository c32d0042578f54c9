//! C6 — Dispatcher Middleware.
//!
//! The per-request entry point: match a route (C2), run the data stage (C3),
//! pick inline (C4) or worker (C5) execution via the hybrid classifier, and
//! assemble the reply. See `spec.md` §4.6.

mod classify;
mod dispatcher;
mod errors;
mod stats;

pub use classify::{classify, ExecutionPath};
pub use dispatcher::Dispatcher;
pub use errors::DispatchError;
pub use stats::{RequestStats, RouteStat};
