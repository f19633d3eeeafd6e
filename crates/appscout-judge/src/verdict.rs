//! Parsing of judgment-service verdicts.
//!
//! Models routinely wrap JSON in markdown code fences even when asked not
//! to, so the raw text is fence-stripped before the strict parse. The
//! top-level `is_approved` flag from the service is recorded but the final
//! approval is re-derived from the three sub-criteria.

use serde::Deserialize;

use appscout_core::{Criterion, GateVerdict};

use crate::error::JudgeError;

#[derive(Debug, Deserialize)]
struct RawCriterion {
    #[serde(default)]
    pass: bool,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    is_approved: Option<bool>,
    niche_market: RawCriterion,
    revenue_model: RawCriterion,
    simplicity: RawCriterion,
}

impl From<RawCriterion> for Criterion {
    fn from(raw: RawCriterion) -> Self {
        Criterion {
            pass: raw.pass,
            reason: raw.reason,
        }
    }
}

/// Removes a surrounding markdown code fence (```json or plain ```) if
/// present, returning the inner text.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line, if any.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map_or(rest, str::trim).trim()
}

/// Parses the completion text into a [`GateVerdict`].
///
/// # Errors
///
/// Returns [`JudgeError::MalformedVerdict`] when the (fence-stripped) text
/// is not the expected JSON shape. Callers convert that into a rejected
/// verdict rather than treating it as fatal.
pub fn parse_verdict(text: &str) -> Result<GateVerdict, JudgeError> {
    let cleaned = strip_code_fences(text);
    let raw: RawVerdict =
        serde_json::from_str(cleaned).map_err(|e| JudgeError::MalformedVerdict {
            context: "gate verdict".to_string(),
            source: e,
        })?;

    Ok(GateVerdict::from_criteria(
        raw.is_approved,
        raw.niche_market.into(),
        raw.revenue_model.into(),
        raw.simplicity.into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERDICT_JSON: &str = r#"{
        "is_approved": true,
        "niche_market": { "pass": true, "reason": "narrow audience" },
        "revenue_model": { "pass": true, "reason": "one-time purchase" },
        "simplicity": { "pass": true, "reason": "single feature" }
    }"#;

    #[test]
    fn parses_bare_json() {
        let verdict = parse_verdict(VERDICT_JSON).unwrap();
        assert!(verdict.approved);
        assert_eq!(verdict.reported_approved, Some(true));
        assert_eq!(verdict.niche_market.reason, "narrow audience");
    }

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{VERDICT_JSON}\n```");
        let verdict = parse_verdict(&fenced).unwrap();
        assert!(verdict.approved);
    }

    #[test]
    fn strips_plain_fence() {
        let fenced = format!("```\n{VERDICT_JSON}\n```");
        let verdict = parse_verdict(&fenced).unwrap();
        assert!(verdict.approved);
    }

    #[test]
    fn approval_rederived_from_criteria() {
        // Service says approved, but one criterion fails.
        let text = r#"{
            "is_approved": true,
            "niche_market": { "pass": true, "reason": "ok" },
            "revenue_model": { "pass": false, "reason": "subscription heavy" },
            "simplicity": { "pass": true, "reason": "ok" }
        }"#;
        let verdict = parse_verdict(text).unwrap();
        assert!(!verdict.approved, "failing criterion must override the flag");
        assert_eq!(verdict.reported_approved, Some(true));
    }

    #[test]
    fn missing_top_level_flag_is_tolerated() {
        let text = r#"{
            "niche_market": { "pass": true, "reason": "ok" },
            "revenue_model": { "pass": true, "reason": "ok" },
            "simplicity": { "pass": true, "reason": "ok" }
        }"#;
        let verdict = parse_verdict(text).unwrap();
        assert!(verdict.approved);
        assert_eq!(verdict.reported_approved, None);
    }

    #[test]
    fn prose_is_malformed() {
        let err = parse_verdict("I think this app looks promising.").unwrap_err();
        assert!(
            matches!(err, JudgeError::MalformedVerdict { .. }),
            "expected MalformedVerdict, got: {err:?}"
        );
    }

    #[test]
    fn missing_criterion_is_malformed() {
        let text = r#"{ "is_approved": true, "niche_market": { "pass": true, "reason": "" } }"#;
        assert!(parse_verdict(text).is_err());
    }

    #[test]
    fn strip_handles_unterminated_fence() {
        let text = "```json\n{\"a\": 1}";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }
}
