//! Evaluation gate: one judgment call per candidate.
//!
//! Every failure mode except quota exhaustion folds into a rejected
//! verdict so the run keeps moving; quota exhaustion is surfaced to the
//! orchestrator, which stops the run.

use tracing::warn;

use appscout_core::{Candidate, GateVerdict};
use appscout_judge::{evaluate_candidate, JudgeClient, JudgeError};

/// Result of gating one candidate.
#[derive(Debug)]
pub enum GateOutcome {
    /// A verdict, including deterministic rejections for failed calls.
    Verdict(GateVerdict),
    /// The judgment quota is gone; the run must stop.
    QuotaExhausted,
}

/// Evaluates `candidate` against the gate criteria.
pub async fn gate_candidate(judge: &JudgeClient, candidate: &Candidate) -> GateOutcome {
    let title = candidate.title().unwrap_or(&candidate.store_id);
    let description = candidate.merged_description();

    match evaluate_candidate(judge, title, &description).await {
        Ok(verdict) => GateOutcome::Verdict(verdict),
        Err(JudgeError::QuotaExhausted) => GateOutcome::QuotaExhausted,
        Err(err) => {
            warn!(
                store_id = %candidate.store_id,
                error = %err,
                "gate evaluation failed, rejecting candidate"
            );
            GateOutcome::Verdict(GateVerdict::rejected_with_error(&err.to_string()))
        }
    }
}
