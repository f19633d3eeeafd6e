//! Database operations for the `candidates` table.
//!
//! The country map and gate verdict are stored as JSONB; [`CandidateRow`]
//! exposes them as raw `serde_json::Value` and [`CandidateRow::to_domain`]
//! decodes into the typed [`appscout_core::Candidate`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use appscout_core::{Candidate, CountryEntry, GateVerdict, Platform};

use crate::DbError;

/// A row from the `candidates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub run_id: i64,
    pub platform: String,
    pub store_id: String,
    pub source_keyword: String,
    pub country_data: serde_json::Value,
    pub verdict: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CANDIDATE_COLUMNS: &str = "id, run_id, platform, store_id, source_keyword, \
     country_data, verdict, created_at, updated_at";

impl CandidateRow {
    /// Decodes the JSONB columns into the typed domain candidate.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::JsonDecode`] if stored JSON does not match the
    /// expected shape.
    pub fn to_domain(&self) -> Result<Candidate, DbError> {
        let platform: Platform =
            serde_json::from_value(serde_json::Value::String(self.platform.clone())).map_err(
                |e| DbError::JsonDecode {
                    context: "candidate platform",
                    source: e,
                },
            )?;

        let country_data: BTreeMap<String, CountryEntry> =
            serde_json::from_value(self.country_data.clone()).map_err(|e| DbError::JsonDecode {
                context: "candidate country_data",
                source: e,
            })?;

        let verdict: Option<GateVerdict> = self
            .verdict
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DbError::JsonDecode {
                context: "candidate verdict",
                source: e,
            })?;

        Ok(Candidate {
            platform,
            store_id: self.store_id.clone(),
            source_keyword: self.source_keyword.clone(),
            country_data,
            verdict,
        })
    }
}

fn encode_country_data(
    country_data: &BTreeMap<String, CountryEntry>,
) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(country_data).map_err(|e| DbError::JsonEncode {
        context: "candidate country_data",
        source: e,
    })
}

/// Inserts a candidate for a run, or updates it in place when the identity
/// `(run_id, platform, store_id)` already exists.
///
/// The country map and verdict are overwritten; `source_keyword` keeps its
/// first-seen value. Returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::JsonEncode`] if the country map or verdict cannot be
/// serialized, or [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_candidate(
    pool: &PgPool,
    run_id: i64,
    candidate: &Candidate,
) -> Result<CandidateRow, DbError> {
    let country_data = encode_country_data(&candidate.country_data)?;
    let verdict = candidate
        .verdict
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DbError::JsonEncode {
            context: "candidate verdict",
            source: e,
        })?;

    let row = sqlx::query_as::<_, CandidateRow>(&format!(
        "INSERT INTO candidates \
             (run_id, platform, store_id, source_keyword, country_data, verdict) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (run_id, platform, store_id) DO UPDATE SET \
             country_data = EXCLUDED.country_data, \
             verdict      = COALESCE(EXCLUDED.verdict, candidates.verdict), \
             updated_at   = NOW() \
         RETURNING {CANDIDATE_COLUMNS}"
    ))
    .bind(run_id)
    .bind(candidate.platform.to_string())
    .bind(&candidate.store_id)
    .bind(&candidate.source_keyword)
    .bind(country_data)
    .bind(verdict)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Overwrites a candidate's gate verdict.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the candidate does not exist,
/// [`DbError::JsonEncode`] on serialization failure, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_candidate_verdict(
    pool: &PgPool,
    candidate_id: i64,
    verdict: &GateVerdict,
) -> Result<(), DbError> {
    let value = serde_json::to_value(verdict).map_err(|e| DbError::JsonEncode {
        context: "candidate verdict",
        source: e,
    })?;

    let result = sqlx::query("UPDATE candidates SET verdict = $1, updated_at = NOW() WHERE id = $2")
        .bind(value)
        .bind(candidate_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Overwrites a candidate's country map with the given entries.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the candidate does not exist,
/// [`DbError::JsonEncode`] on serialization failure, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_candidate_country_data(
    pool: &PgPool,
    candidate_id: i64,
    country_data: &BTreeMap<String, CountryEntry>,
) -> Result<(), DbError> {
    let value = encode_country_data(country_data)?;

    let result =
        sqlx::query("UPDATE candidates SET country_data = $1, updated_at = NOW() WHERE id = $2")
            .bind(value)
            .bind(candidate_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetches a candidate row by internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_candidate(pool: &PgPool, id: i64) -> Result<CandidateRow, DbError> {
    let row = sqlx::query_as::<_, CandidateRow>(&format!(
        "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns all candidates discovered by one run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_candidates_for_run(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<CandidateRow>, DbError> {
    let rows = sqlx::query_as::<_, CandidateRow>(&format!(
        "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE run_id = $1 ORDER BY id"
    ))
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all candidates across runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_candidates(pool: &PgPool, limit: i64) -> Result<Vec<CandidateRow>, DbError> {
    let rows = sqlx::query_as::<_, CandidateRow>(&format!(
        "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
