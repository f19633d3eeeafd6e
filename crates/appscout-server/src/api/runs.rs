use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appscout_db::runs::RunRow;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_pipeline_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct StartRunBody {
    pub keywords: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunItem {
    run_id: Uuid,
    status: String,
    trigger_source: String,
    keywords: Vec<String>,
    countries: Vec<String>,
    candidates_found: i32,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<RunRow> for RunItem {
    fn from(row: RunRow) -> Self {
        Self {
            run_id: row.public_id,
            status: row.status,
            trigger_source: row.trigger_source,
            keywords: row.keywords,
            countries: row.countries,
            candidates_found: row.candidates_found,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RunStatusData {
    running: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct RunLogData {
    run_id: Uuid,
    log: String,
}

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunItem>>>, ApiError> {
    let rows = appscout_db::runs::list_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(RunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Starts a discovery run in the background; `202` with the run row, or
/// `409` when a run is already active.
pub(super) async fn start_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<StartRunBody>>,
) -> Result<(StatusCode, Json<ApiResponse<RunItem>>), ApiError> {
    let Json(body) = body.unwrap_or_default();

    let run = state
        .orchestrator
        .start_run("api", body.keywords, body.countries)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RunItem::from(run),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn run_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<RunStatusData>> {
    Json(ApiResponse {
        data: RunStatusData {
            running: state.orchestrator.is_running(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn list_run_candidates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<super::candidates::CandidateItem>>>, ApiError> {
    let run = appscout_db::runs::get_run_by_public_id(&state.pool, run_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = appscout_db::candidates::list_candidates_for_run(&state.pool, run.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows
            .into_iter()
            .map(super::candidates::CandidateItem::from)
            .collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_run_log(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ApiResponse<RunLogData>>, ApiError> {
    let run = appscout_db::runs::get_run_by_public_id(&state.pool, run_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: RunLogData {
            run_id: run.public_id,
            log: run.log_output,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
