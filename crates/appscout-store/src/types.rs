//! Wire types for the app-store search and lookup endpoints.
//!
//! Both endpoints share the `{ "resultCount": N, "results": [...] }`
//! envelope; [`SearchEnvelope`] captures it once. Field names follow the
//! store's camel-case JSON and are renamed on the way in.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use appscout_core::CountryMetadata;

/// Envelope for the search and lookup endpoints.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    #[serde(rename = "resultCount", default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One app entry from the search or lookup results array.
///
/// Only the fields the pipeline consumes are modelled; unknown fields are
/// ignored. `track_id` arrives as a number and is carried as `i64`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "trackId")]
    pub track_id: i64,
    #[serde(rename = "trackName", default)]
    pub track_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "formattedPrice", default)]
    pub formatted_price: Option<String>,
    #[serde(rename = "trackViewUrl", default)]
    pub track_view_url: String,
    #[serde(rename = "averageUserRating", default)]
    pub average_user_rating: Option<f64>,
    #[serde(rename = "userRatingCount", default)]
    pub user_rating_count: Option<i64>,
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<DateTime<Utc>>,
    /// The store reports the size as a decimal string.
    #[serde(rename = "fileSizeBytes", default)]
    pub file_size_bytes: Option<String>,
    #[serde(rename = "primaryGenreName", default)]
    pub primary_genre_name: Option<String>,
}

impl SearchResult {
    /// The store identifier as used throughout the pipeline.
    #[must_use]
    pub fn store_id(&self) -> String {
        self.track_id.to_string()
    }

    /// Converts the wire entry into the domain metadata record.
    #[must_use]
    pub fn into_metadata(self) -> CountryMetadata {
        CountryMetadata {
            title: self.track_name,
            description: self.description,
            price: self.formatted_price.unwrap_or_else(|| "Free".to_string()),
            url: self.track_view_url,
            rating_average: self.average_user_rating,
            rating_count: self.user_rating_count,
            release_date: self.release_date,
            size_bytes: self.file_size_bytes.and_then(|s| s.parse::<i64>().ok()),
            genre: self.primary_genre_name,
        }
    }
}
