//! Database operations for the `runs` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub status: String,
    pub trigger_source: String,
    pub keywords: Vec<String>,
    pub countries: Vec<String>,
    pub candidates_found: i32,
    pub log_output: String,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, status, trigger_source, keywords, countries, \
     candidates_found, log_output, error_message, started_at, completed_at, created_at";

/// Creates a new run in `running` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_run(
    pool: &PgPool,
    trigger_source: &str,
    keywords: &[String],
    countries: &[String],
) -> Result<RunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, RunRow>(&format!(
        "INSERT INTO runs (public_id, status, trigger_source, keywords, countries) \
         VALUES ($1, 'running', $2, $3, $4) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .bind(keywords)
    .bind(countries)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `succeeded`, recording the final candidate count and log.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run was not in `running`
/// state, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_run(
    pool: &PgPool,
    id: i64,
    candidates_found: i32,
    log_output: &str,
) -> Result<(), DbError> {
    finish_run(pool, id, "succeeded", candidates_found, log_output, None).await
}

/// Marks a run as `aborted` (quota exhaustion), keeping the partial count.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run was not in `running`
/// state, or [`DbError::Sqlx`] if the update fails.
pub async fn abort_run(
    pool: &PgPool,
    id: i64,
    candidates_found: i32,
    log_output: &str,
    error_message: &str,
) -> Result<(), DbError> {
    finish_run(
        pool,
        id,
        "aborted",
        candidates_found,
        log_output,
        Some(error_message),
    )
    .await
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run was not in `running`
/// state, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_run(
    pool: &PgPool,
    id: i64,
    log_output: &str,
    error_message: &str,
) -> Result<(), DbError> {
    finish_run(pool, id, "failed", 0, log_output, Some(error_message)).await
}

async fn finish_run(
    pool: &PgPool,
    id: i64,
    status: &str,
    candidates_found: i32,
    log_output: &str,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE runs \
         SET status = $1, candidates_found = $2, log_output = $3, \
             error_message = $4, completed_at = NOW() \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(status)
    .bind(candidates_found)
    .bind(log_output)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_run(pool: &PgPool, id: i64) -> Result<RunRow, DbError> {
    let row = sqlx::query_as::<_, RunRow>(&format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Fetches a single run by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_run_by_public_id(pool: &PgPool, public_id: Uuid) -> Result<RunRow, DbError> {
    let row = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM runs WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_runs(pool: &PgPool, limit: i64) -> Result<Vec<RunRow>, DbError> {
    let rows = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM runs ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
