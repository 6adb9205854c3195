//! Torrent records, job outcomes and the processing state machine.

mod aggregate;
mod state_machine;
mod types;

pub use aggregate::{aggregate, aggregate_all};
pub use state_machine::{TorrentError, TorrentStateMachine};
pub use types::{JobOutcome, OutcomeStatus, PipelineFailure, TorrentRecord, TorrentStatus};
