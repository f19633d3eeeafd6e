//! Negative-review harvesting from the paginated review feed.

use tracing::{debug, warn};

use appscout_core::{Platform, PlatformCapabilities, ReviewRecord};
use appscout_store::StoreClient;

/// Reviews rated above this are not collected.
const NEGATIVE_RATING_MAX: u8 = 3;

/// Collects up to `review_cap` negative (rating <= 3) reviews for an app,
/// walking feed pages 1..=`max_pages`.
///
/// Stops early on an empty page, a page fetch failure (keeping what was
/// already collected), or when the cap fills mid-page. Platforms without a
/// public review feed return an empty list.
pub async fn harvest_negative_reviews(
    store: &StoreClient,
    platform: Platform,
    store_id: &str,
    country: &str,
    max_pages: u32,
    review_cap: usize,
) -> Vec<ReviewRecord> {
    if !platform.supports_reviews() {
        debug!(%platform, store_id, "platform has no review feed, skipping harvest");
        return Vec::new();
    }

    let mut collected: Vec<ReviewRecord> = Vec::new();

    for page in 1..=max_pages {
        let entries = match store.fetch_review_page(store_id, country, page).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(store_id, country, page, error = %err, "review page fetch failed, stopping");
                break;
            }
        };

        if entries.is_empty() {
            break;
        }

        for entry in entries {
            let Some(record) = entry.into_record() else {
                continue;
            };
            if record.rating <= NEGATIVE_RATING_MAX {
                collected.push(record);
                if collected.len() >= review_cap {
                    return collected;
                }
            }
        }
    }

    collected
}
