//! Re-upload orchestrator.
//!
//! A single polling loop drives every completed job through
//! identity resolution, per-tracker upload and outcome aggregation.
//! Jobs are handled strictly one after another.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::ReuploadOrchestrator;
pub use types::{CycleReport, JobAbort, JobContext, JobReport, OrchestratorError, OrchestratorStatus};
