pub mod enrichment;
pub mod extraction;
pub mod orchestrator;
pub mod search;
pub mod tasks;

pub use orchestrator::{Pipeline, RunOutcome};
