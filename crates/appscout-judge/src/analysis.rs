//! Deep analysis of collected negative reviews.
//!
//! Analysis is best-effort: an empty review set short-circuits to fixed
//! placeholder text without spending a service call, and any service or
//! parse failure degrades to placeholders instead of failing enrichment.

use serde::Deserialize;
use tracing::warn;

use appscout_core::ReviewRecord;

use crate::client::JudgeClient;
use crate::error::JudgeError;
use crate::prompts::analysis_prompt;
use crate::verdict::strip_code_fences;

pub const NO_REVIEWS_PAIN_POINTS: &str = "No negative reviews available to analyze.";
pub const NO_REVIEWS_REQUESTED_FEATURES: &str = "No feature requests identified.";
const ANALYSIS_FAILED_PAIN_POINTS: &str = "Analysis unavailable for this candidate.";
const ANALYSIS_FAILED_REQUESTED_FEATURES: &str = "Analysis unavailable for this candidate.";

/// Summarized complaints and feature requests from negative reviews.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewAnalysis {
    pub pain_points: String,
    pub requested_features: String,
}

impl ReviewAnalysis {
    fn no_reviews() -> Self {
        Self {
            pain_points: NO_REVIEWS_PAIN_POINTS.to_string(),
            requested_features: NO_REVIEWS_REQUESTED_FEATURES.to_string(),
        }
    }

    fn failed() -> Self {
        Self {
            pain_points: ANALYSIS_FAILED_PAIN_POINTS.to_string(),
            requested_features: ANALYSIS_FAILED_REQUESTED_FEATURES.to_string(),
        }
    }
}

fn parse_analysis(text: &str) -> Result<ReviewAnalysis, JudgeError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| JudgeError::MalformedVerdict {
        context: "review analysis".to_string(),
        source: e,
    })
}

/// Runs the deep review analysis for one candidate.
///
/// Never fails: degraded outcomes produce placeholder text. The only hard
/// outcome a caller must handle is that a rate-limit-exhausted call also
/// degrades (enrichment is not worth aborting a run over).
pub async fn analyze_reviews(
    client: &JudgeClient,
    title: &str,
    reviews: &[ReviewRecord],
) -> ReviewAnalysis {
    if reviews.is_empty() {
        return ReviewAnalysis::no_reviews();
    }

    let prompt = analysis_prompt(title, reviews);
    match client.complete(&prompt).await {
        Ok(text) => match parse_analysis(&text) {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(title, error = %err, "review analysis response did not parse");
                ReviewAnalysis::failed()
            }
        },
        Err(err) => {
            warn!(title, error = %err, "review analysis call failed");
            ReviewAnalysis::failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_analysis() {
        let text = "```json\n{\"pain_points\": \"Sync loses data.\", \"requested_features\": \"Offline mode.\"}\n```";
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.pain_points, "Sync loses data.");
        assert_eq!(analysis.requested_features, "Offline mode.");
    }

    #[test]
    fn rejects_prose() {
        assert!(parse_analysis("users are unhappy").is_err());
    }

    #[tokio::test]
    async fn empty_reviews_short_circuit_without_calling_service() {
        // Unroutable base URL: if the client were called the test would
        // error rather than return the placeholder.
        let client = JudgeClient::with_base_url("k", "m", 1, 0, 0, "http://127.0.0.1:1")
            .expect("client should build");
        let analysis = analyze_reviews(&client, "Shift Planner", &[]).await;
        assert_eq!(analysis.pain_points, NO_REVIEWS_PAIN_POINTS);
        assert_eq!(analysis.requested_features, NO_REVIEWS_REQUESTED_FEATURES);
    }
}
