//! Domain types for discovered candidates and their evaluation state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Store metadata for a candidate in one country. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Formatted display price as the store reports it, e.g. `"Free"` or `"$2.99"`.
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub rating_average: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<i64>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size_bytes: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
}

/// Per-country lookup state for a candidate.
///
/// Three states are distinguished: a key absent from the country map means
/// "never tried"; `NotFound` means "tried and unavailable" and is never
/// retried; `Available` carries the fetched metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CountryEntry {
    Available {
        #[serde(flatten)]
        metadata: CountryMetadata,
    },
    NotFound,
}

impl CountryEntry {
    #[must_use]
    pub fn metadata(&self) -> Option<&CountryMetadata> {
        match self {
            CountryEntry::Available { metadata } => Some(metadata),
            CountryEntry::NotFound => None,
        }
    }
}

/// One sub-criterion of the evaluation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub pass: bool,
    #[serde(default)]
    pub reason: String,
}

impl Criterion {
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            pass: false,
            reason: reason.into(),
        }
    }
}

/// The three-criterion gate decision for a candidate.
///
/// `approved` is always re-derived as the AND of the three sub-criteria.
/// The judgment service also reports its own top-level flag; that value is
/// kept in `reported_approved` for audit but never drives the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub approved: bool,
    #[serde(default)]
    pub reported_approved: Option<bool>,
    pub niche_market: Criterion,
    pub revenue_model: Criterion,
    pub simplicity: Criterion,
}

impl GateVerdict {
    /// Builds a verdict from the three sub-criteria, deriving `approved`.
    #[must_use]
    pub fn from_criteria(
        reported_approved: Option<bool>,
        niche_market: Criterion,
        revenue_model: Criterion,
        simplicity: Criterion,
    ) -> Self {
        let approved = niche_market.pass && revenue_model.pass && simplicity.pass;
        Self {
            approved,
            reported_approved,
            niche_market,
            revenue_model,
            simplicity,
        }
    }

    /// A deterministic rejection verdict recording an evaluation failure.
    #[must_use]
    pub fn rejected_with_error(reason: &str) -> Self {
        Self {
            approved: false,
            reported_approved: None,
            niche_market: Criterion::failed(format!("evaluation failed: {reason}")),
            revenue_model: Criterion::failed("evaluation failed"),
            simplicity: Criterion::failed("evaluation failed"),
        }
    }
}

/// A single negative user review collected during enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A discovered app under evaluation.
///
/// Identity is `(platform, store_id)`. The country map is keyed by
/// lower-case ISO country codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub platform: Platform,
    pub store_id: String,
    pub source_keyword: String,
    pub country_data: BTreeMap<String, CountryEntry>,
    #[serde(default)]
    pub verdict: Option<GateVerdict>,
}

impl Candidate {
    #[must_use]
    pub fn new(platform: Platform, store_id: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            platform,
            store_id: store_id.into(),
            source_keyword: keyword.into(),
            country_data: BTreeMap::new(),
            verdict: None,
        }
    }

    /// Title from the first country that has metadata, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.country_data
            .values()
            .find_map(CountryEntry::metadata)
            .map(|m| m.title.as_str())
    }

    /// Concatenated description across countries, used as gate input.
    ///
    /// Countries are iterated in map order so the merged text is stable.
    #[must_use]
    pub fn merged_description(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for entry in self.country_data.values() {
            if let Some(meta) = entry.metadata() {
                if !meta.description.is_empty() && !parts.contains(&meta.description.as_str()) {
                    parts.push(&meta.description);
                }
            }
        }
        parts.join("\n\n")
    }
}
