//! Wire types for the paginated customer-review feed.
//!
//! The feed wraps entries in `{ "feed": { "entry": [...] } }`. Quirks the
//! parser must tolerate: the `entry` key is absent when a page has no
//! reviews, holds a single object instead of an array when there is exactly
//! one, and the first entry of page 1 is app metadata without a rating.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use appscout_core::ReviewRecord;

#[derive(Debug, Deserialize)]
pub struct ReviewFeedResponse {
    #[serde(default)]
    pub feed: Option<ReviewFeed>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewFeed {
    #[serde(default, deserialize_with = "one_or_many")]
    pub entry: Vec<ReviewEntry>,
}

/// A wrapped `{ "label": "..." }` value as the feed formats every field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorField {
    #[serde(default)]
    pub name: Option<Label>,
}

/// One entry from a review-feed page.
///
/// Entries without an `im:rating` field are store-metadata entries, not
/// reviews; callers skip them.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewEntry {
    #[serde(rename = "im:rating", default)]
    pub rating: Option<Label>,
    #[serde(default)]
    pub title: Option<Label>,
    #[serde(default)]
    pub content: Option<Label>,
    #[serde(default)]
    pub author: Option<AuthorField>,
    #[serde(default)]
    pub updated: Option<Label>,
}

impl ReviewEntry {
    /// Parses the rating label. `None` when the entry carries no rating
    /// field at all (metadata entry); defaults to 5 when the label exists
    /// but does not parse, so bad data is excluded from negative-review
    /// collection rather than polluting it.
    #[must_use]
    pub fn parsed_rating(&self) -> Option<u8> {
        self.rating
            .as_ref()
            .map(|label| label.label.trim().parse::<u8>().unwrap_or(5))
    }

    /// Converts the entry into a domain review record.
    ///
    /// Returns `None` for metadata entries without a rating.
    #[must_use]
    pub fn into_record(self) -> Option<ReviewRecord> {
        let rating = self.parsed_rating()?;
        let updated_at = self
            .updated
            .as_ref()
            .and_then(|label| DateTime::parse_from_rfc3339(&label.label).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(ReviewRecord {
            rating,
            title: self.title.map(|l| l.label).unwrap_or_default(),
            body: self.content.map(|l| l.label).unwrap_or_default(),
            author: self.author.and_then(|a| a.name).map(|l| l.label),
            updated_at,
        })
    }
}

/// Accepts either a single entry object or an array of entries.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<ReviewEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ReviewEntry>),
        One(Box<ReviewEntry>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(entries) => entries,
        OneOrMany::One(entry) => vec![*entry],
    })
}
