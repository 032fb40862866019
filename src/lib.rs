// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cli;
pub mod dashboard;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod sink;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::ingest::types::{NewsRecord, RawItem, Readiness, SourceAdapter};
pub use crate::pipeline::{run_once, RunOutcome, RunReport};
