//! C3 — Data Stage and C4 — Render Stage.
//!
//! These two stages are deliberately kept apart: [`data_stage::fetch_data`]
//! is the only place I/O happens, always on the caller's task, while
//! [`render_stage::render`] is a pure synchronous transform that must behave
//! identically whether called inline or from a worker thread. See `spec.md`
//! §4.3 and §4.4.

mod data_stage;
mod errors;
mod render_stage;

pub use data_stage::{fetch_data, DataStageOutcome};
pub use errors::StageError;
pub use render_stage::{render, RenderStageOutcome};
