//! Prompt construction for gate evaluation and deep review analysis.

use std::fmt::Write;

use appscout_core::ReviewRecord;

/// Builds the gate-evaluation prompt for one candidate.
#[must_use]
pub fn evaluation_prompt(title: &str, description: &str) -> String {
    format!(
        r#"You are evaluating a mobile app as a potential indie-developer opportunity.

App title: {title}

App description:
{description}

Judge the app against exactly these three criteria:
1. niche_market: the app serves a specific, narrow audience rather than a broad consumer market.
2. revenue_model: the app can plausibly earn money with a simple model (paid, one-time unlock, or light subscription), not ad-volume economics.
3. simplicity: the core product could be rebuilt by a solo developer in a few months.

Respond with ONLY a JSON object, no markdown, in exactly this shape:
{{
  "is_approved": <bool>,
  "niche_market": {{ "pass": <bool>, "reason": "<short reason>" }},
  "revenue_model": {{ "pass": <bool>, "reason": "<short reason>" }},
  "simplicity": {{ "pass": <bool>, "reason": "<short reason>" }}
}}"#
    )
}

/// Builds the deep-analysis prompt over a candidate's negative reviews.
#[must_use]
pub fn analysis_prompt(title: &str, reviews: &[ReviewRecord]) -> String {
    let mut listing = String::new();
    for review in reviews {
        let _ = writeln!(
            listing,
            "- [{} star] {}: {}",
            review.rating, review.title, review.body
        );
    }

    format!(
        r#"Below are negative user reviews for the mobile app "{title}".

{listing}
Summarize what users are unhappy about and what they are asking for.

Respond with ONLY a JSON object, no markdown, in exactly this shape:
{{
  "pain_points": "<paragraph describing recurring complaints>",
  "requested_features": "<paragraph describing features users ask for>"
}}"#
    )
}
