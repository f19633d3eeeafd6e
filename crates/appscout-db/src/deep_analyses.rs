//! Database operations for the `deep_analyses` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use appscout_core::ReviewRecord;

use crate::DbError;

/// A row from the `deep_analyses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeepAnalysisRow {
    pub id: i64,
    pub candidate_id: i64,
    pub country: String,
    pub reviews: serde_json::Value,
    pub pain_points: String,
    pub requested_features: String,
    pub collected_at: DateTime<Utc>,
}

const ANALYSIS_COLUMNS: &str =
    "id, candidate_id, country, reviews, pain_points, requested_features, collected_at";

impl DeepAnalysisRow {
    /// Decodes the stored reviews JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::JsonDecode`] if the stored value does not parse.
    pub fn reviews(&self) -> Result<Vec<ReviewRecord>, DbError> {
        serde_json::from_value(self.reviews.clone()).map_err(|e| DbError::JsonDecode {
            context: "deep analysis reviews",
            source: e,
        })
    }
}

/// Inserts or overwrites the analysis for one `(candidate, country)` pair.
///
/// Re-collection replaces only the targeted country's row; other countries'
/// prior analyses are untouched.
///
/// # Errors
///
/// Returns [`DbError::JsonEncode`] if the reviews cannot be serialized, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_deep_analysis(
    pool: &PgPool,
    candidate_id: i64,
    country: &str,
    reviews: &[ReviewRecord],
    pain_points: &str,
    requested_features: &str,
) -> Result<DeepAnalysisRow, DbError> {
    let reviews_json = serde_json::to_value(reviews).map_err(|e| DbError::JsonEncode {
        context: "deep analysis reviews",
        source: e,
    })?;

    let row = sqlx::query_as::<_, DeepAnalysisRow>(&format!(
        "INSERT INTO deep_analyses \
             (candidate_id, country, reviews, pain_points, requested_features) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (candidate_id, country) DO UPDATE SET \
             reviews            = EXCLUDED.reviews, \
             pain_points        = EXCLUDED.pain_points, \
             requested_features = EXCLUDED.requested_features, \
             collected_at       = NOW() \
         RETURNING {ANALYSIS_COLUMNS}"
    ))
    .bind(candidate_id)
    .bind(country)
    .bind(reviews_json)
    .bind(pain_points)
    .bind(requested_features)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches the analysis for one `(candidate, country)` pair, if collected.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_deep_analysis(
    pool: &PgPool,
    candidate_id: i64,
    country: &str,
) -> Result<Option<DeepAnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, DeepAnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM deep_analyses \
         WHERE candidate_id = $1 AND country = $2"
    ))
    .bind(candidate_id)
    .bind(country)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all collected analyses for a candidate, keyed by country.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_deep_analyses(
    pool: &PgPool,
    candidate_id: i64,
) -> Result<Vec<DeepAnalysisRow>, DbError> {
    let rows = sqlx::query_as::<_, DeepAnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM deep_analyses \
         WHERE candidate_id = $1 ORDER BY country"
    ))
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
