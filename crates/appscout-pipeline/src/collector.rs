//! Candidate collection: keyword x country search fan-out.
//!
//! Each (keyword, country) pair is searched independently; a failing pair
//! is logged and skipped so one bad search never sinks the run. Results are
//! merged by store id, shuffled, and capped to the pool size.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use appscout_core::{Candidate, CountryEntry, Platform};
use appscout_store::StoreClient;

/// Apps in this genre are never indie-opportunity candidates.
const EXCLUDED_GENRE: &str = "Games";

/// Searches every (keyword, country) pair and merges the results into a
/// deduplicated, shuffled candidate pool of at most `pool_cap` entries.
///
/// A candidate keeps the keyword it was first seen under; its per-country
/// metadata is overwritten on every sighting (last write wins). An empty
/// result across all pairs is an empty pool, not an error.
pub async fn collect_candidates(
    store: &StoreClient,
    keywords: &[String],
    countries: &[String],
    search_limit: u32,
    pool_cap: usize,
) -> Vec<Candidate> {
    let mut pool: Vec<Candidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for keyword in keywords {
        for country in countries {
            let country = country.to_lowercase();
            let results = match store.search(keyword, &country, search_limit).await {
                Ok(results) => results,
                Err(err) => {
                    warn!(keyword, country, error = %err, "search failed, skipping pair");
                    continue;
                }
            };

            debug!(keyword, country, count = results.len(), "search results");

            for result in results {
                if result
                    .primary_genre_name
                    .as_deref()
                    .is_some_and(|g| g.contains(EXCLUDED_GENRE))
                {
                    continue;
                }

                let store_id = result.store_id();
                let position = *index.entry(store_id.clone()).or_insert_with(|| {
                    pool.push(Candidate::new(Platform::Ios, store_id, keyword));
                    pool.len() - 1
                });

                pool[position].country_data.insert(
                    country.clone(),
                    CountryEntry::Available {
                        metadata: result.into_metadata(),
                    },
                );
            }
        }
    }

    pool.shuffle(&mut rand::rng());
    pool.truncate(pool_cap);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_body(entries: &[(i64, &str, &str)]) -> serde_json::Value {
        let results: Vec<serde_json::Value> = entries
            .iter()
            .map(|(id, name, genre)| {
                json!({
                    "trackId": id,
                    "trackName": name,
                    "description": format!("{name} description"),
                    "primaryGenreName": genre
                })
            })
            .collect();
        json!({ "resultCount": results.len(), "results": results })
    }

    fn test_store(server: &MockServer) -> StoreClient {
        StoreClient::with_base_url(5, "appscout-test/0.1", 0, 0, &server.uri())
            .expect("failed to build test StoreClient")
    }

    #[tokio::test]
    async fn merges_duplicates_and_keeps_first_keyword() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("term", "alpha"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&search_body(&[(1, "App One", "Productivity")])),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("term", "beta"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&search_body(&[(1, "App One", "Productivity")])),
            )
            .mount(&server)
            .await;

        let store = test_store(&server);
        let keywords = vec!["alpha".to_string(), "beta".to_string()];
        let countries = vec!["us".to_string()];
        let pool = collect_candidates(&store, &keywords, &countries, 10, 40).await;

        assert_eq!(pool.len(), 1, "same store id must merge");
        assert_eq!(pool[0].source_keyword, "alpha", "first-seen keyword wins");
    }

    #[tokio::test]
    async fn same_app_in_two_countries_merges_into_one_candidate() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("country", "us"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&search_body(&[(111, "Visual Timer", "Productivity")])),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("country", "kr"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&search_body(&[(111, "Visual Timer", "Productivity")])),
            )
            .mount(&server)
            .await;

        let store = test_store(&server);
        let keywords = vec!["visual timer".to_string()];
        let countries = vec!["us".to_string(), "kr".to_string()];
        let pool = collect_candidates(&store, &keywords, &countries, 10, 40).await;

        assert_eq!(pool.len(), 1, "one app id across countries is one candidate");
        assert_eq!(pool[0].store_id, "111");
        assert_eq!(pool[0].country_data.len(), 2);
        assert!(pool[0].country_data.contains_key("us"));
        assert!(pool[0].country_data.contains_key("kr"));
    }

    #[tokio::test]
    async fn filters_games_genre() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&search_body(&[
                (1, "Puzzle Quest", "Games"),
                (2, "Shift Planner", "Productivity"),
            ])))
            .mount(&server)
            .await;

        let store = test_store(&server);
        let pool = collect_candidates(
            &store,
            &["planner".to_string()],
            &["us".to_string()],
            10,
            40,
        )
        .await;

        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].store_id, "2");
    }

    #[tokio::test]
    async fn failing_pair_is_skipped_not_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("country", "us"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("country", "de"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&search_body(&[(3, "Timer", "Utilities")])),
            )
            .mount(&server)
            .await;

        let store = test_store(&server);
        let countries = vec!["us".to_string(), "de".to_string()];
        let pool = collect_candidates(&store, &["timer".to_string()], &countries, 10, 40).await;

        assert_eq!(pool.len(), 1);
        assert!(pool[0].country_data.contains_key("de"));
        assert!(!pool[0].country_data.contains_key("us"));
    }

    #[tokio::test]
    async fn pool_is_capped() {
        let server = MockServer::start().await;

        let entries: Vec<(i64, String)> = (1..=8).map(|i| (i, format!("App {i}"))).collect();
        let borrowed: Vec<(i64, &str, &str)> = entries
            .iter()
            .map(|(i, name)| (*i, name.as_str(), "Utilities"))
            .collect();

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&search_body(&borrowed)))
            .mount(&server)
            .await;

        let store = test_store(&server);
        let pool =
            collect_candidates(&store, &["apps".to_string()], &["us".to_string()], 10, 5).await;

        assert_eq!(pool.len(), 5);
    }

    #[tokio::test]
    async fn empty_results_yield_empty_pool() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(&json!({"resultCount": 0, "results": []})),
            )
            .mount(&server)
            .await;

        let store = test_store(&server);
        let pool =
            collect_candidates(&store, &["nothing".to_string()], &["us".to_string()], 10, 40)
                .await;
        assert!(pool.is_empty());
    }
}
