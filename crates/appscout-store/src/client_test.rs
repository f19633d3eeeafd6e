use super::*;

fn test_client() -> StoreClient {
    StoreClient::with_base_url(5, "appscout-test/0.1", 0, 0, "https://store.example.com")
        .expect("failed to build test StoreClient")
}

#[test]
fn search_url_encodes_term_and_params() {
    let client = test_client();
    let url = client.build_url(
        "/search",
        &[
            ("term", "ADHD Planner"),
            ("country", "us"),
            ("entity", "software"),
            ("limit", "10"),
        ],
    );
    assert_eq!(
        url.as_str(),
        "https://store.example.com/search?term=ADHD+Planner&country=us&entity=software&limit=10"
    );
}

#[test]
fn lookup_url_carries_id_and_country() {
    let client = test_client();
    let url = client.build_url("/lookup", &[("id", "123456"), ("country", "de")]);
    assert_eq!(
        url.as_str(),
        "https://store.example.com/lookup?id=123456&country=de"
    );
}

#[test]
fn review_feed_url_has_no_query_string() {
    let client = test_client();
    let url = client.build_url("/us/rss/customerreviews/page=3/id=42/sortby=mostrecent/json", &[]);
    assert_eq!(
        url.as_str(),
        "https://store.example.com/us/rss/customerreviews/page=3/id=42/sortby=mostrecent/json"
    );
    assert!(url.query().is_none());
}

#[test]
fn with_base_url_strips_trailing_slash() {
    let client =
        StoreClient::with_base_url(5, "appscout-test/0.1", 0, 0, "https://store.example.com/")
            .expect("failed to build test StoreClient");
    let url = client.build_url("/search", &[("term", "x")]);
    assert_eq!(url.as_str(), "https://store.example.com/search?term=x");
}

#[test]
fn with_base_url_rejects_garbage() {
    let result = StoreClient::with_base_url(5, "appscout-test/0.1", 0, 0, "not a url");
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, StoreError::InvalidBaseUrl { .. }),
        "expected InvalidBaseUrl, got: {err:?}"
    );
}
