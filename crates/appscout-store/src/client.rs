//! HTTP client for the public app-store search, lookup, and review-feed
//! endpoints.
//!
//! Wraps `reqwest` with typed error handling and automatic retry on
//! transient failures. All query parameters go through
//! [`reqwest::Url::query_pairs_mut`] so terms are safely percent-encoded.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::StoreError;
use crate::retry::retry_with_backoff;
use crate::reviews::{ReviewEntry, ReviewFeedResponse};
use crate::types::{SearchEnvelope, SearchResult};

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// Client for the public app-store endpoints.
///
/// Use [`StoreClient::new`] for production or [`StoreClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Debug)]
pub struct StoreClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl StoreClient {
    /// Creates a client pointed at the production store endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, StoreError> {
        Self::with_base_url(
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`StoreError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
        base_url: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            StoreError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Searches the store for software matching `term` in `country`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::RateLimited`] / [`StoreError::Http`] after retries
    ///   are exhausted.
    /// - [`StoreError::UnexpectedStatus`] on a non-2xx status.
    /// - [`StoreError::Deserialize`] if the body does not match the
    ///   expected envelope.
    pub async fn search(
        &self,
        term: &str,
        country: &str,
        limit: u32,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let url = self.build_url(
            "/search",
            &[
                ("term", term),
                ("country", country),
                ("entity", "software"),
                ("limit", &limit.to_string()),
            ],
        );

        let envelope = self
            .request_envelope(&url, &format!("search(term={term}, country={country})"))
            .await?;
        Ok(envelope.results)
    }

    /// Looks up a single app by store id in one country.
    ///
    /// Returns `Ok(None)` when the store reports zero results — the app is
    /// definitively unavailable in that country, which is not an error.
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::search`].
    pub async fn lookup(
        &self,
        store_id: &str,
        country: &str,
    ) -> Result<Option<SearchResult>, StoreError> {
        let url = self.build_url("/lookup", &[("id", store_id), ("country", country)]);

        let envelope = self
            .request_envelope(&url, &format!("lookup(id={store_id}, country={country})"))
            .await?;
        Ok(envelope.results.into_iter().next())
    }

    /// Fetches one page of the customer-review feed for an app.
    ///
    /// An empty page is returned as an empty `Vec`, not an error.
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::search`]; additionally
    /// [`StoreError::NotFound`] when the feed 404s for an unknown id.
    pub async fn fetch_review_page(
        &self,
        store_id: &str,
        country: &str,
        page: u32,
    ) -> Result<Vec<ReviewEntry>, StoreError> {
        let path =
            format!("/{country}/rss/customerreviews/page={page}/id={store_id}/sortby=mostrecent/json");
        let url = self.build_url(&path, &[]);
        let context = format!("review feed page {page} for id={store_id} country={country}");

        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        let body = retry_with_backoff(max_retries, backoff_base_secs, || {
            let url = url.clone();
            async move { self.request_text(url).await }
        })
        .await?;

        let parsed: ReviewFeedResponse =
            serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
                context,
                source: e,
            })?;

        Ok(parsed.feed.map(|f| f.entry).unwrap_or_default())
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    async fn request_envelope(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<SearchEnvelope, StoreError> {
        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        let body = retry_with_backoff(max_retries, backoff_base_secs, || {
            let url = url.clone();
            async move { self.request_text(url).await }
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Sends a GET request and returns the body text, mapping 429/404 and
    /// other non-2xx statuses to typed errors.
    async fn request_text(&self, url: Url) -> Result<String, StoreError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(StoreError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
