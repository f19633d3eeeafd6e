//! Per-country availability enrichment.
//!
//! Each (candidate, country) pair is looked up against the store at most
//! once, ever. Both outcomes are cached in the candidate's country map:
//! metadata when available, an explicit not-found marker when the store
//! reports zero results. Transport errors write nothing, so the pair stays
//! eligible for a later attempt.

use tracing::{debug, warn};

use appscout_core::{Candidate, CountryEntry, PlatformCapabilities};
use appscout_store::StoreClient;

/// Ensures `candidate` has a country entry for `country`.
///
/// Returns `true` when the country map changed and should be persisted.
pub async fn enrich_country(
    store: &StoreClient,
    candidate: &mut Candidate,
    country: &str,
) -> bool {
    let country = country.to_lowercase();

    if let Some(entry) = candidate.country_data.get(&country) {
        debug!(
            store_id = %candidate.store_id,
            country,
            not_found = matches!(entry, CountryEntry::NotFound),
            "country entry cached, skipping lookup"
        );
        return false;
    }

    if !candidate.platform.supports_country_lookup() {
        debug!(
            platform = %candidate.platform,
            store_id = %candidate.store_id,
            "platform has no country lookup, skipping"
        );
        return false;
    }

    match store.lookup(&candidate.store_id, &country).await {
        Ok(Some(result)) => {
            candidate.country_data.insert(
                country,
                CountryEntry::Available {
                    metadata: result.into_metadata(),
                },
            );
            true
        }
        Ok(None) => {
            candidate
                .country_data
                .insert(country, CountryEntry::NotFound);
            true
        }
        Err(err) => {
            warn!(
                store_id = %candidate.store_id,
                country,
                error = %err,
                "country lookup failed, leaving entry absent"
            );
            false
        }
    }
}
