//! Discovery pipeline: candidate collection, gate evaluation, review
//! harvesting, country enrichment, and run orchestration.

pub mod collector;
pub mod enrichment;
pub mod error;
pub mod gate;
pub mod guard;
pub mod harvester;
pub mod orchestrator;

pub use collector::collect_candidates;
pub use enrichment::enrich_country;
pub use error::PipelineError;
pub use gate::{gate_candidate, GateOutcome};
pub use guard::{RunGuard, RunPermit};
pub use harvester::harvest_negative_reviews;
pub use orchestrator::{DetailReport, Orchestrator};
