//! Judgment-service client: candidate gate evaluation and deep review
//! analysis against an OpenAI-compatible chat endpoint.

pub mod analysis;
pub mod client;
pub mod error;
pub mod prompts;
pub mod verdict;

pub use analysis::{analyze_reviews, ReviewAnalysis};
pub use client::JudgeClient;
pub use error::JudgeError;
pub use verdict::{parse_verdict, strip_code_fences};

use appscout_core::GateVerdict;

/// Evaluates one candidate against the gate criteria.
///
/// # Errors
///
/// Propagates [`JudgeError`] from the service call or verdict parse;
/// callers decide which failures become rejected verdicts and which
/// (quota exhaustion) abort the run.
pub async fn evaluate_candidate(
    client: &JudgeClient,
    title: &str,
    description: &str,
) -> Result<GateVerdict, JudgeError> {
    let prompt = prompts::evaluation_prompt(title, description);
    let text = client.complete(&prompt).await?;
    parse_verdict(&text)
}
